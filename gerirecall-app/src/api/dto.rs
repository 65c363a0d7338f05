use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AddCardIn {
    pub id: Option<String>,
    pub front: String,
    pub back: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewIn {
    pub performance: i64,
    #[serde(default)]
    pub time_spent: u64,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorOut {
    pub error: String,
}

pub const DEFAULT_LIMIT: usize = 20;

fn default_category() -> String {
    "general".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}
