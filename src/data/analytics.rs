#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPerformance {
    pub question_id: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub correct_attempts: u32,
    #[serde(default)]
    pub total_attempts: u32,
    pub correct_percentage: f64,
}
