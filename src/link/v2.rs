//! `th2.exactpro.com/v2` link spec shape

use serde::{Deserialize, Serialize};

use super::{DictionaryRoute, LinkSet, MultiDictionaryRoute, PinRoute};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LinkSpecV2 {
    #[serde(default)]
    pub boxes_relation: Option<BoxesRelationV2>,
    #[serde(default)]
    pub dictionaries_relation: Option<Vec<DictionaryRoute>>,
    #[serde(default)]
    pub multi_dictionaries_relation: Option<Vec<MultiDictionaryRoute>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BoxesRelationV2 {
    #[serde(default)]
    pub router_mq: Option<Vec<PinRoute>>,
    #[serde(default)]
    pub router_grpc: Option<Vec<PinRoute>>,
}

impl LinkSpecV2 {
    pub fn normalize(self) -> LinkSet {
        let boxes = self.boxes_relation.unwrap_or_default();
        LinkSet {
            mq: boxes.router_mq.unwrap_or_default(),
            grpc: boxes.router_grpc.unwrap_or_default(),
            dictionaries: self.dictionaries_relation.unwrap_or_default(),
            multi_dictionaries: self.multi_dictionaries_relation.unwrap_or_default(),
        }
    }
}
