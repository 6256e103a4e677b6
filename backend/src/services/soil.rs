//! Soil health and fertilizer recommendation service
//!
//! Turns a farmer's approximate location into a persisted soil sample, and
//! a sample plus target crop into fertilizer guidance. Both operations ask
//! the generative text model for JSON matching a fixed schema, strip
//! markdown fences, parse strictly, validate ranges, and retry with a
//! correction prompt a bounded number of times before giving up.

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::genai::{strip_code_fences, GenAiClient};
use shared::models::{
    FertilizerRecommendation, NutrientLevels, RecommendationSource, SoilSample,
};
use shared::types::GeoPoint;
use shared::validation::{clamp_confidence, validate_location, validate_percent, validate_ph};

/// Soil health service
#[derive(Clone)]
pub struct SoilService {
    db: PgPool,
    genai: GenAiClient,
    model_version: String,
    max_repair_attempts: u32,
}

/// Input for generating a soil sample
#[derive(Debug, Deserialize)]
pub struct GenerateSampleInput {
    pub field_id: String,
    pub location: GeoPoint,
}

/// Input for requesting a fertilizer recommendation
#[derive(Debug, Deserialize)]
pub struct RecommendFertilizerInput {
    pub sample_id: Uuid,
    pub crop: String,
}

/// Soil-sample JSON schema the model is instructed to emit
#[derive(Debug, Deserialize)]
struct GeneratedSoilSample {
    depth_cm: f64,
    nitrogen: f64,
    phosphorus: f64,
    potassium: f64,
    ph: f64,
    organic_carbon_pct: f64,
    cec: f64,
    texture: String,
    #[serde(default)]
    micronutrients: BTreeMap<String, f64>,
}

/// Fertilizer JSON schema the model is instructed to emit
#[derive(Debug, Deserialize)]
struct GeneratedRecommendation {
    nitrogen_kg_ha: f64,
    phosphorus_kg_ha: f64,
    potassium_kg_ha: f64,
    products: Vec<String>,
    application_schedule: Vec<String>,
    rationale: String,
    confidence: f64,
}

/// Sample row as stored in Postgres
#[derive(Debug, sqlx::FromRow)]
struct SampleRow {
    id: Uuid,
    farmer_id: Uuid,
    field_id: String,
    longitude: f64,
    latitude: f64,
    sample_date: chrono::NaiveDate,
    depth_cm: f64,
    nitrogen: f64,
    phosphorus: f64,
    potassium: f64,
    ph: f64,
    organic_carbon_pct: f64,
    cec: f64,
    texture: String,
    micronutrients: sqlx::types::Json<BTreeMap<String, f64>>,
    lab_report_ref: Option<String>,
    created_at: chrono::DateTime<Utc>,
}

impl From<SampleRow> for SoilSample {
    fn from(row: SampleRow) -> Self {
        SoilSample {
            id: row.id,
            farmer_id: row.farmer_id,
            field_id: row.field_id,
            location: GeoPoint::new(row.longitude, row.latitude),
            sample_date: row.sample_date,
            depth_cm: row.depth_cm,
            nutrients: NutrientLevels {
                nitrogen: row.nitrogen,
                phosphorus: row.phosphorus,
                potassium: row.potassium,
            },
            ph: row.ph,
            organic_carbon_pct: row.organic_carbon_pct,
            cec: row.cec,
            texture: row.texture,
            micronutrients: row.micronutrients.0,
            lab_report_ref: row.lab_report_ref,
            created_at: row.created_at,
        }
    }
}

const SELECT_SAMPLE: &str = r#"
    SELECT id, farmer_id, field_id, longitude, latitude, sample_date, depth_cm,
           nitrogen, phosphorus, potassium, ph, organic_carbon_pct, cec,
           texture, micronutrients, lab_report_ref, created_at
    FROM soil_samples
"#;

impl SoilService {
    /// Create a new SoilService instance
    pub fn new(db: PgPool, genai: GenAiClient, config: &Config) -> Self {
        Self {
            db,
            genai,
            model_version: config.genai.text_model.clone(),
            max_repair_attempts: config.genai.max_repair_attempts,
        }
    }

    /// Generate a soil sample for a location and persist it
    pub async fn generate_sample(
        &self,
        farmer_id: Uuid,
        input: GenerateSampleInput,
    ) -> AppResult<SoilSample> {
        validate_location(&input.location).map_err(|msg| AppError::Validation {
            field: "location".to_string(),
            message: msg.to_string(),
        })?;
        if input.field_id.trim().is_empty() {
            return Err(AppError::Validation {
                field: "field_id".to_string(),
                message: "Field identifier is required".to_string(),
            });
        }

        let prompt = soil_prompt(&input.location);
        let generated: GeneratedSoilSample = self.generate_validated(&prompt).await?;

        let row = sqlx::query_as::<_, SampleRow>(
            r#"
            INSERT INTO soil_samples
                (farmer_id, field_id, longitude, latitude, sample_date, depth_cm,
                 nitrogen, phosphorus, potassium, ph, organic_carbon_pct, cec,
                 texture, micronutrients)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, farmer_id, field_id, longitude, latitude, sample_date, depth_cm,
                      nitrogen, phosphorus, potassium, ph, organic_carbon_pct, cec,
                      texture, micronutrients, lab_report_ref, created_at
            "#,
        )
        .bind(farmer_id)
        .bind(input.field_id.trim())
        .bind(input.location.longitude)
        .bind(input.location.latitude)
        .bind(Utc::now().date_naive())
        .bind(generated.depth_cm)
        .bind(generated.nitrogen)
        .bind(generated.phosphorus)
        .bind(generated.potassium)
        .bind(generated.ph)
        .bind(generated.organic_carbon_pct)
        .bind(generated.cec)
        .bind(&generated.texture)
        .bind(sqlx::types::Json(&generated.micronutrients))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Generate fertilizer guidance for a persisted sample and target crop
    pub async fn recommend_fertilizer(
        &self,
        input: RecommendFertilizerInput,
    ) -> AppResult<FertilizerRecommendation> {
        if input.crop.trim().is_empty() {
            return Err(AppError::Validation {
                field: "crop".to_string(),
                message: "Crop name is required".to_string(),
            });
        }

        // Soft reference, validated at point of use
        let sample: SoilSample = sqlx::query_as::<_, SampleRow>(&format!(
            "{} WHERE id = $1",
            SELECT_SAMPLE
        ))
        .bind(input.sample_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Soil sample".to_string()))?
        .into();

        let crop = input.crop.trim();
        let prompt = fertilizer_prompt(&sample, crop);
        let generated: GeneratedRecommendation = self.generate_validated(&prompt).await?;

        let (confidence, clamped) = clamp_confidence(generated.confidence);
        if clamped {
            tracing::warn!(
                raw = generated.confidence,
                "Model confidence outside [0,1], clamped"
            );
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO fertilizer_recommendations
                (sample_id, crop, nitrogen_kg_ha, phosphorus_kg_ha, potassium_kg_ha,
                 products, application_schedule, rationale, source, model_version, confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(sample.id)
        .bind(crop)
        .bind(generated.nitrogen_kg_ha)
        .bind(generated.phosphorus_kg_ha)
        .bind(generated.potassium_kg_ha)
        .bind(&generated.products)
        .bind(&generated.application_schedule)
        .bind(&generated.rationale)
        .bind(RecommendationSource::Ml.as_str())
        .bind(&self.model_version)
        .bind(confidence)
        .fetch_one(&self.db)
        .await?;

        Ok(FertilizerRecommendation {
            id,
            sample_id: sample.id,
            crop: crop.to_string(),
            dosage: NutrientLevels {
                nitrogen: generated.nitrogen_kg_ha,
                phosphorus: generated.phosphorus_kg_ha,
                potassium: generated.potassium_kg_ha,
            },
            products: generated.products,
            application_schedule: generated.application_schedule,
            rationale: generated.rationale,
            source: RecommendationSource::Ml,
            model_version: self.model_version.clone(),
            confidence,
            created_at: Utc::now(),
        })
    }

    /// Call the text model and parse/validate its output, retrying with a
    /// correction prompt when parsing or validation fails
    async fn generate_validated<T>(&self, prompt: &str) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned + ValidatedOutput,
    {
        let mut current_prompt = prompt.to_string();
        let mut last_error = String::new();

        for attempt in 0..=self.max_repair_attempts {
            let raw = self.genai.generate_text(&current_prompt).await?;

            match parse_generated::<T>(&raw) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "Model output failed validation");
                    last_error = err;
                    current_prompt = repair_prompt(prompt, &raw, &last_error);
                }
            }
        }

        Err(AppError::ModelOutput(format!(
            "Model output failed validation after {} attempts: {}",
            self.max_repair_attempts + 1,
            last_error
        )))
    }
}

/// Parse fence-stripped model output into a schema type and validate ranges
fn parse_generated<T>(raw: &str) -> Result<T, String>
where
    T: serde::de::DeserializeOwned + ValidatedOutput,
{
    let body = strip_code_fences(raw);
    let value: T = serde_json::from_str(body).map_err(|e| format!("not valid JSON: {}", e))?;
    value.validate_ranges()?;
    Ok(value)
}

/// Range checks applied after deserialization
trait ValidatedOutput {
    fn validate_ranges(&self) -> Result<(), String>;
}

impl ValidatedOutput for GeneratedSoilSample {
    fn validate_ranges(&self) -> Result<(), String> {
        validate_ph(self.ph).map_err(str::to_string)?;
        validate_percent(self.organic_carbon_pct).map_err(|_| {
            format!(
                "organic_carbon_pct out of range: {}",
                self.organic_carbon_pct
            )
        })?;
        if self.depth_cm <= 0.0 {
            return Err(format!("depth_cm must be positive, got {}", self.depth_cm));
        }
        if self.nitrogen < 0.0 || self.phosphorus < 0.0 || self.potassium < 0.0 {
            return Err("nutrient levels cannot be negative".to_string());
        }
        if self.texture.trim().is_empty() {
            return Err("texture must be non-empty".to_string());
        }
        Ok(())
    }
}

impl ValidatedOutput for GeneratedRecommendation {
    fn validate_ranges(&self) -> Result<(), String> {
        if self.nitrogen_kg_ha < 0.0 || self.phosphorus_kg_ha < 0.0 || self.potassium_kg_ha < 0.0 {
            return Err("dosages cannot be negative".to_string());
        }
        if self.products.is_empty() {
            return Err("products must be non-empty".to_string());
        }
        if self.application_schedule.is_empty() {
            return Err("application_schedule must be non-empty".to_string());
        }
        Ok(())
    }
}

/// Prompt instructing the model to emit a soil sample JSON object
fn soil_prompt(location: &GeoPoint) -> String {
    format!(
        "You are an agronomy assistant. Estimate typical soil test values for \
         farmland near longitude {:.4}, latitude {:.4}. Respond with ONLY a JSON \
         object, no prose, matching exactly this schema: \
         {{\"depth_cm\": number, \"nitrogen\": number (kg/ha), \"phosphorus\": number (kg/ha), \
         \"potassium\": number (kg/ha), \"ph\": number (0-14), \"organic_carbon_pct\": number (0-100), \
         \"cec\": number (cmol/kg), \"texture\": string, \
         \"micronutrients\": object mapping element symbol to ppm}}",
        location.longitude, location.latitude
    )
}

/// Prompt instructing the model to emit fertilizer guidance JSON
fn fertilizer_prompt(sample: &SoilSample, crop: &str) -> String {
    format!(
        "You are an agronomy assistant. A soil test for a field growing {crop} \
         reports: nitrogen {n} kg/ha, phosphorus {p} kg/ha, potassium {k} kg/ha, \
         pH {ph}, organic carbon {oc}%, CEC {cec} cmol/kg, texture \"{texture}\". \
         Recommend fertilizer for {crop}. Respond with ONLY a JSON object, no \
         prose, matching exactly this schema: \
         {{\"nitrogen_kg_ha\": number, \"phosphorus_kg_ha\": number, \"potassium_kg_ha\": number, \
         \"products\": [string], \"application_schedule\": [string], \
         \"rationale\": string, \"confidence\": number (0-1)}}",
        crop = crop,
        n = sample.nutrients.nitrogen,
        p = sample.nutrients.phosphorus,
        k = sample.nutrients.potassium,
        ph = sample.ph,
        oc = sample.organic_carbon_pct,
        cec = sample.cec,
        texture = sample.texture,
    )
}

/// Correction prompt fed back to the model after invalid output
fn repair_prompt(original: &str, raw_output: &str, error: &str) -> String {
    format!(
        "{original}\n\nYour previous response was rejected: {error}\n\
         Previous response:\n{raw_output}\n\n\
         Respond again with ONLY the corrected JSON object.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_SAMPLE: &str = r#"{
        "depth_cm": 15,
        "nitrogen": 280.0,
        "phosphorus": 23.0,
        "potassium": 190.0,
        "ph": 6.8,
        "organic_carbon_pct": 0.6,
        "cec": 18.2,
        "texture": "sandy loam",
        "micronutrients": {"Zn": 0.8, "Fe": 5.2}
    }"#;

    #[test]
    fn test_parse_valid_soil_sample() {
        let sample: GeneratedSoilSample = parse_generated(VALID_SAMPLE).unwrap();
        assert_eq!(sample.texture, "sandy loam");
        assert_eq!(sample.micronutrients.len(), 2);
    }

    #[test]
    fn test_parse_fenced_soil_sample() {
        let fenced = format!("```json\n{}\n```", VALID_SAMPLE);
        let a: GeneratedSoilSample = parse_generated(VALID_SAMPLE).unwrap();
        let b: GeneratedSoilSample = parse_generated(&fenced).unwrap();
        assert_eq!(a.ph, b.ph);
        assert_eq!(a.texture, b.texture);
    }

    #[test]
    fn test_parse_rejects_prose() {
        let result = parse_generated::<GeneratedSoilSample>("Sure! Here is the soil data.");
        assert!(result.unwrap_err().contains("not valid JSON"));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let missing_ph = r#"{"depth_cm": 15, "nitrogen": 1, "phosphorus": 1,
            "potassium": 1, "organic_carbon_pct": 1, "cec": 1, "texture": "loam"}"#;
        assert!(parse_generated::<GeneratedSoilSample>(missing_ph).is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_ph() {
        let bad = VALID_SAMPLE.replace("6.8", "19.0");
        assert!(parse_generated::<GeneratedSoilSample>(&bad).is_err());
    }

    #[test]
    fn test_recommendation_requires_products() {
        let rec = r#"{"nitrogen_kg_ha": 50, "phosphorus_kg_ha": 25, "potassium_kg_ha": 20,
            "products": [], "application_schedule": ["basal"], "rationale": "r", "confidence": 0.9}"#;
        assert!(parse_generated::<GeneratedRecommendation>(rec).is_err());
    }

    #[test]
    fn test_recommendation_confidence_is_clamped_not_rejected() {
        let rec = r#"{"nitrogen_kg_ha": 50, "phosphorus_kg_ha": 25, "potassium_kg_ha": 20,
            "products": ["Urea"], "application_schedule": ["basal", "top dressing"],
            "rationale": "standard dose", "confidence": 1.4}"#;
        let parsed: GeneratedRecommendation = parse_generated(rec).unwrap();
        let (confidence, clamped) = clamp_confidence(parsed.confidence);
        assert_eq!(confidence, 1.0);
        assert!(clamped);
    }

    #[test]
    fn test_repair_prompt_carries_error() {
        let prompt = repair_prompt("original", "bad output", "not valid JSON: EOF");
        assert!(prompt.contains("original"));
        assert!(prompt.contains("bad output"));
        assert!(prompt.contains("not valid JSON: EOF"));
    }
}
