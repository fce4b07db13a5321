use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::client::ActionCall;
use crate::entity::{Entity, EntityClient};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::Parameter;

pub struct Items;

impl Entity for Items {
    const PATH: &'static str = "items";
    type Record = Item;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Item {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EntityClient<'_, Items> {
    /// `POST /items/{id}/ImportBase64EncodedImage` with the image already
    /// base64-encoded by the caller.
    pub fn build_import_base64_encoded_image(&self, id: impl Display, image: &str) -> Result<HttpRequest> {
        let call = ActionCall::post("ImportBase64EncodedImage")
            .on(id)
            .json(serde_json::json!({ "Base64EncodedImage": image }));
        self.build_action(&call)
    }

    pub fn parse_import_base64_encoded_image(&self, response: HttpResponse) -> Result<Vec<Parameter>> {
        self.parse_action_parameters(response)
    }
}
