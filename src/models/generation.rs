use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "bad quality, worst quality, text, signature, watermark, extra limbs";

/// Sampling parameters sent alongside every prompt. The space expects them
/// positionally, in exactly the order of the fields below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub start_step: u32,
    pub guidance: f64,
    /// `"-1"` lets the space pick a random seed.
    pub seed: String,
    pub true_cfg: f64,
    pub width: u32,
    pub height: u32,
    pub num_steps: u32,
    pub id_weight: f64,
    pub negative_prompt: String,
    pub timestep_to_start_cfg: u32,
    pub max_sequence_length: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            start_step: 0,
            guidance: 4.0,
            seed: "-1".to_string(),
            true_cfg: 1.0,
            width: 896,
            height: 1152,
            num_steps: 20,
            id_weight: 1.0,
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            timestep_to_start_cfg: 1,
            max_sequence_length: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Image path or reference the remote space can resolve.
    pub id_image: String,
    #[serde(default)]
    pub params: GenerationParams,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, id_image: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            id_image: id_image.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Body for the job creation endpoint: `{"data": [prompt, {"path": id_image}, ...params]}`.
    pub fn to_payload(&self) -> Value {
        let p = &self.params;
        json!({
            "data": [
                self.prompt,
                { "path": self.id_image },
                p.start_step,
                p.guidance,
                p.seed,
                p.true_cfg,
                p.width,
                p.height,
                p.num_steps,
                p.id_weight,
                p.negative_prompt,
                p.timestep_to_start_cfg,
                p.max_sequence_length
            ]
        })
    }
}

/// Correlates a submitted job with its event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub event_id: String,
}

impl JobHandle {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
        }
    }

    pub fn poll_url(&self, api_url: &str) -> String {
        format!("{}/{}", api_url, self.event_id)
    }
}
