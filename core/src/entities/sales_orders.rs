use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::client::ActionCall;
use crate::entity::{Entity, EntityClient};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};

pub struct SalesOrders;

impl Entity for SalesOrders {
    const PATH: &'static str = "salesOrders";
    type Record = SalesOrder;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SalesOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arp_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_net: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EntityClient<'_, SalesOrders> {
    /// `POST /salesOrders/{id}/ApplyCampaign[/{campaignCode}]`. Without a
    /// code the server picks the applicable campaigns itself.
    pub fn build_apply_campaign(&self, id: impl Display, campaign_code: Option<&str>) -> Result<HttpRequest> {
        let mut call = ActionCall::post("ApplyCampaign").on(id);
        if let Some(code) = campaign_code {
            call = call.param(code);
        }
        self.build_action(&call)
    }

    pub fn parse_apply_campaign(&self, response: HttpResponse) -> Result<SalesOrder> {
        self.parse_action_record(response)
    }
}
