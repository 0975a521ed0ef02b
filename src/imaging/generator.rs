use std::future::Future;
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{PortraitError, PortraitResult};
use crate::prompt::PromptSpec;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_call_timing;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub width: u32,
    pub height: u32,
    pub guidance_scale: f32,
    pub inference_steps: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            width: 1024,
            height: 1024,
            guidance_scale: 7.0,
            inference_steps: 28,
        }
    }
}

/// The diffusion model behind the prompts. Calls may take minutes.
pub trait ImageGenerator: Send + Sync {
    fn generate(
        &self,
        spec: &PromptSpec,
        params: &GenerationParams,
    ) -> impl Future<Output = PortraitResult<Vec<DynamicImage>>> + Send;
}

#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    width: u32,
    height: u32,
    cfg_scale: f32,
    steps: u32,
    batch_size: u32,
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

pub fn decode_images(body: &str) -> PortraitResult<Vec<DynamicImage>> {
    let payload: Txt2ImgResponse = serde_json::from_str(body)
        .map_err(|err| PortraitError::ImageGeneration(format!("Invalid image response: {err}")))?;
    if payload.images.is_empty() {
        return Err(PortraitError::ImageGeneration(
            "Image backend returned no images".to_string(),
        ));
    }

    payload
        .images
        .iter()
        .map(|encoded| {
            // Some backends return data URLs rather than bare base64.
            let data = encoded
                .split_once(";base64,")
                .map(|(_, data)| data)
                .unwrap_or(encoded);
            let bytes = general_purpose::STANDARD.decode(data.trim()).map_err(|err| {
                PortraitError::ImageGeneration(format!("Invalid base64 image data: {err}"))
            })?;
            image::load_from_memory(&bytes)
                .map_err(|err| PortraitError::ImageGeneration(format!("Undecodable image: {err}")))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct HttpImageGenerator {
    url: String,
    timeout: Duration,
}

impl HttpImageGenerator {
    pub fn new(url: &str, timeout: Duration) -> Self {
        HttpImageGenerator {
            url: url.to_string(),
            timeout,
        }
    }
}

impl ImageGenerator for HttpImageGenerator {
    async fn generate(
        &self,
        spec: &PromptSpec,
        params: &GenerationParams,
    ) -> PortraitResult<Vec<DynamicImage>> {
        let prompt = spec.prompt();
        let request = Txt2ImgRequest {
            prompt: &prompt,
            negative_prompt: spec.negative_prompt,
            width: params.width,
            height: params.height,
            cfg_scale: params.guidance_scale,
            steps: params.inference_steps,
            batch_size: 1,
        };
        info!("Calling image backend {} with prompt: {}", self.url, prompt);

        let metadata = json!({
            "width": params.width,
            "height": params.height,
            "steps": params.inference_steps,
        });
        let body = log_call_timing("image", "txt2img", Some(metadata), || async {
            let response = get_http_client()
                .post(&self.url)
                .timeout(self.timeout)
                .json(&request)
                .send()
                .await
                .map_err(|err| PortraitError::ImageGeneration(format!("Image request failed: {err}")))?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                warn!("Image backend error body: {}", detail);
                return Err(PortraitError::ImageGeneration(format!(
                    "Image request failed with status {status}"
                )));
            }

            response
                .text()
                .await
                .map_err(|err| PortraitError::ImageGeneration(format!("Invalid image response: {err}")))
        })
        .await?;

        decode_images(&body)
    }
}
