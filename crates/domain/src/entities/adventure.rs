//! Adventure entity - the scenario a session is played in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Adventure {
    pub id: String,
    pub name: String,
    pub setting: String,
    pub description: String,
    /// Hand-written opening used when the model cannot produce one.
    pub opening_narrative: Option<String>,
}
