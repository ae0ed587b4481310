//! Material-tracking submissions.
//!
//! A submission is the free-form record captured by the tracking form. It is
//! stored flat in the spreadsheet: one row in the `Submissions` sheet plus
//! detail rows for its materials and self-validation sources.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Column order of the `Submissions` sheet.
pub const SUBMISSION_COLUMNS: [&str; 28] = [
    "Submission ID",
    "Submission Date",
    "Date",
    "Production Facility",
    "Value Chain Process (Main)",
    "Value Chain Process (Sub)",
    "Aware Token Type",
    "Material Specification",
    "Main Color (Selected)",
    "Main Color (Text)",
    "Production Lot/Batch No.",
    "Total Weight (Kgs)",
    "Sustainable Process Claims",
    "Wet Processing",
    "Materials",
    "Aware Asset ID",
    "Tracer Added",
    "Type of Tracer",
    "Aware Tracer Scan Date",
    "Aware Tracer Test Report",
    "Custom Tracer Name",
    "Custom Tracer Date",
    "Custom Tracer Report",
    "Validation Method",
    "Self Validation Data",
    "Guan Xu Full Name",
    "STCP Full Name",
    "Certificates",
];

/// Column order of the `Materials` sheet.
pub const MATERIAL_COLUMNS: [&str; 8] = [
    "Submission ID",
    "Submission Date",
    "Production Lot/Batch No.",
    "Composition Material",
    "Percentage",
    "Sustainable",
    "Sustainability Claim",
    "Feedstock Type",
];

/// Column order of the `Validation Sources` sheet.
pub const VALIDATION_SOURCE_COLUMNS: [&str; 17] = [
    "Submission ID",
    "Production Lot/Batch No.",
    "Source #",
    "Kgs",
    "Feedstock Type",
    "Feedstock Source Type",
    "Source Name",
    "Address",
    "Source Certification",
    "Source Invoice No.",
    "Source Invoice Date",
    "Invoice File",
    "Packing List File",
    "Proof of Delivery File",
    "Lab Testing File",
    "Certificates",
    "Other Documents",
];

/// Column holding the submission id in every sheet.
pub const ID_COLUMN: &str = "Submission ID";

// ============================================================================
// Enumerations
// ============================================================================

/// Sustainability claim attached to a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SustainabilityClaim {
    Recycled,
    Regenerative,
    Organic,
    Transitional,
    Better,
    RegenerativeOrganicCertified,
}

impl SustainabilityClaim {
    pub fn as_str(&self) -> &'static str {
        match self {
            SustainabilityClaim::Recycled => "Recycled",
            SustainabilityClaim::Regenerative => "Regenerative",
            SustainabilityClaim::Organic => "Organic",
            SustainabilityClaim::Transitional => "Transitional",
            SustainabilityClaim::Better => "Better",
            SustainabilityClaim::RegenerativeOrganicCertified => "RegenerativeOrganicCertified",
        }
    }
}

/// Origin of recycled feedstock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedstockType {
    PostIndustrial,
    PostConsumer,
}

impl FeedstockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedstockType::PostIndustrial => "PostIndustrial",
            FeedstockType::PostConsumer => "PostConsumer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TracerKind {
    Aware,
    Custom,
}

impl TracerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TracerKind::Aware => "Aware",
            TracerKind::Custom => "Custom",
        }
    }
}

/// How the material origin was validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationMethod {
    SelfValidation,
    GuanXu,
    #[serde(rename = "STCP")]
    Stcp,
}

impl ValidationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMethod::SelfValidation => "SelfValidation",
            ValidationMethod::GuanXu => "GuanXu",
            ValidationMethod::Stcp => "STCP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CertificateStatus {
    Verified,
    Pending,
    Expired,
}

// ============================================================================
// Nested records
// ============================================================================

/// One component of the material composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Material {
    pub composition_material: String,
    pub percentage: f64,
    pub sustainable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sustainability_claim: Option<SustainabilityClaim>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedstock_recycled_materials: Option<FeedstockType>,
}

/// A named supporting document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub name: String,
    pub file: String,
}

/// A feedstock source declared under self validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationSource {
    pub kgs: Option<f64>,
    pub feedstock_type: String,
    pub feedstock_source_type: String,
    pub source_name: String,
    pub address: String,
    pub source_certification: String,
    pub source_invoice_no: String,
    pub source_invoice_date: String,
    pub invoice_file: String,
    pub packing_list_file: String,
    pub proof_of_delivery_file: String,
    pub lab_testing_file: String,
    pub certificates: Vec<Document>,
    pub other_documents: Vec<Document>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelfValidation {
    pub sources: Vec<ValidationSource>,
    pub total_source_input: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: CertificateStatus,
    #[serde(default)]
    pub valid_thru_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificates {
    pub environmental: Vec<Certificate>,
    pub social: Vec<Certificate>,
    pub chemical: Vec<Certificate>,
}

// ============================================================================
// Submission
// ============================================================================

/// A material-tracking form submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Submission {
    pub id: Option<String>,
    pub submission_date: Option<String>,

    pub date: Option<String>,
    pub production_facility: Option<String>,
    pub value_chain_process_main: Option<String>,
    pub value_chain_process_sub: Option<String>,
    pub aware_token_type: Option<String>,
    pub material_specification: Option<String>,

    pub main_color_selected: Option<String>,
    pub main_color_text: Option<String>,

    pub production_lot_batch_no: Option<String>,
    /// Kept as sent: a number stays a number cell, text stays text.
    #[serde(deserialize_with = "text_or_number")]
    pub total_weight_kgs: Option<Value>,

    pub sustainable_process_claims: bool,
    pub wet_processing: bool,

    pub materials: Vec<Material>,

    pub aware_asset_id: Option<String>,

    pub tracer_added: bool,
    pub type_of_tracer: Option<TracerKind>,
    pub aware_tracer_positive_scan_date: Option<String>,
    pub aware_tracer_test_report: Option<String>,
    pub aware_tracer_confirmation: bool,
    pub custom_tracer_name: Option<String>,
    pub custom_tracer_date_positive_report: Option<String>,
    pub custom_tracer_test_report: Option<String>,
    pub custom_tracer_confirmation: bool,

    pub validation_method: Option<ValidationMethod>,
    pub self_validation: Option<SelfValidation>,
    pub guan_xu_documentation: Option<String>,
    pub guan_xu_full_name: Option<String>,
    pub guan_xu_declaration: bool,
    pub stcp_documentation: Option<String>,
    pub stcp_full_name: Option<String>,
    pub stcp_declaration: bool,

    pub certificates: Certificates,
}

/// Form clients send the weight either as text or as a number.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ (Value::String(_) | Value::Number(_))) => Ok(Some(value)),
        None | Some(Value::Null) => Ok(None),
        Some(other) => Err(serde::de::Error::invalid_type(
            serde::de::Unexpected::Other(value_kind(&other)),
            &"a number or a string",
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        _ => "value",
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true)
}

fn text(value: &Option<String>) -> Value {
    match value {
        Some(s) if !s.is_empty() => Value::String(s.clone()),
        _ => Value::Null,
    }
}

fn yes_no(flag: bool) -> Value {
    Value::String(if flag { "Yes" } else { "No" }.to_string())
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

impl Submission {
    /// Checks the required fields, returning every violation.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let required = [
            (&self.date, "Date is required"),
            (&self.production_facility, "Production Facility is required"),
            (
                &self.value_chain_process_main,
                "Value Chain Process (Main) is required",
            ),
            (
                &self.value_chain_process_sub,
                "Value Chain Process (Sub) is required",
            ),
            (
                &self.material_specification,
                "Material Specification is required",
            ),
            (&self.main_color_selected, "Main Color is required"),
            (
                &self.production_lot_batch_no,
                "Production Lot/Batch No. is required",
            ),
        ];
        for (value, message) in required {
            if is_blank(value) {
                errors.push(message.to_string());
            }
        }
        let weight_missing = match &self.total_weight_kgs {
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
            None => true,
        };
        if weight_missing {
            errors.push("Total Weight is required".to_string());
        }

        if self.materials.is_empty() {
            errors.push("At least one material composition is required".to_string());
        }
        for (index, material) in self.materials.iter().enumerate() {
            if !(0.0..=100.0).contains(&material.percentage) {
                errors.push(format!(
                    "Material {} percentage must be between 0 and 100",
                    index + 1
                ));
            }
        }

        if self.tracer_added && self.type_of_tracer.is_none() {
            errors.push("Type of Tracer is required when tracer is added".to_string());
        }

        if self.validation_method.is_none() {
            errors.push("Validation method is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Stamps an id and submission date when they are absent.
    ///
    /// Returns the id the submission carries afterwards.
    pub fn assign_id(&mut self, now: DateTime<Utc>) -> String {
        if self.submission_date.is_none() {
            self.submission_date = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        match &self.id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => {
                let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
                let id = format!("SUB-{}-{:06X}", now.format("%Y%m%d%H%M%S"), suffix);
                self.id = Some(id.clone());
                id
            }
        }
    }

    /// Flattens the submission into a `Submissions` sheet row, aligned with
    /// [`SUBMISSION_COLUMNS`].
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.submission_date),
            text(&self.date),
            text(&self.production_facility),
            text(&self.value_chain_process_main),
            text(&self.value_chain_process_sub),
            text(&self.aware_token_type),
            text(&self.material_specification),
            text(&self.main_color_selected),
            text(&self.main_color_text),
            text(&self.production_lot_batch_no),
            match &self.total_weight_kgs {
                Some(Value::String(s)) if s.is_empty() => Value::Null,
                Some(weight) => weight.clone(),
                None => Value::Null,
            },
            yes_no(self.sustainable_process_claims),
            yes_no(self.wet_processing),
            Value::String(json!(self.materials).to_string()),
            text(&self.aware_asset_id),
            yes_no(self.tracer_added),
            self.type_of_tracer
                .map(|t| Value::String(t.as_str().to_string()))
                .unwrap_or(Value::Null),
            text(&self.aware_tracer_positive_scan_date),
            text(&self.aware_tracer_test_report),
            text(&self.custom_tracer_name),
            text(&self.custom_tracer_date_positive_report),
            text(&self.custom_tracer_test_report),
            self.validation_method
                .map(|m| Value::String(m.as_str().to_string()))
                .unwrap_or(Value::Null),
            Value::String(json!(self.self_validation).to_string()),
            text(&self.guan_xu_full_name),
            text(&self.stcp_full_name),
            Value::String(json!(self.certificates).to_string()),
        ]
    }

    /// Rows for the `Materials` sheet, aligned with [`MATERIAL_COLUMNS`].
    pub fn material_rows(&self) -> Vec<Vec<Value>> {
        self.materials
            .iter()
            .map(|material| {
                vec![
                    text(&self.id),
                    text(&self.submission_date),
                    text(&self.production_lot_batch_no),
                    Value::String(material.composition_material.clone()),
                    number(material.percentage),
                    yes_no(material.sustainable),
                    Value::String(
                        material
                            .sustainability_claim
                            .map(|c| c.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    ),
                    Value::String(
                        material
                            .feedstock_recycled_materials
                            .map(|f| f.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    ),
                ]
            })
            .collect()
    }

    /// Rows for the `Validation Sources` sheet, aligned with
    /// [`VALIDATION_SOURCE_COLUMNS`]. Only self-validated submissions have
    /// source rows.
    pub fn validation_source_rows(&self) -> Vec<Vec<Value>> {
        let sources = match (&self.validation_method, &self.self_validation) {
            (Some(ValidationMethod::SelfValidation), Some(data)) => &data.sources,
            _ => return Vec::new(),
        };

        sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                vec![
                    text(&self.id),
                    text(&self.production_lot_batch_no),
                    json!(index + 1),
                    source.kgs.map(number).unwrap_or(Value::Null),
                    Value::String(source.feedstock_type.clone()),
                    Value::String(source.feedstock_source_type.clone()),
                    Value::String(source.source_name.clone()),
                    Value::String(source.address.clone()),
                    Value::String(source.source_certification.clone()),
                    Value::String(source.source_invoice_no.clone()),
                    Value::String(source.source_invoice_date.clone()),
                    Value::String(source.invoice_file.clone()),
                    Value::String(source.packing_list_file.clone()),
                    Value::String(source.proof_of_delivery_file.clone()),
                    Value::String(source.lab_testing_file.clone()),
                    Value::String(json!(source.certificates).to_string()),
                    Value::String(json!(source.other_documents).to_string()),
                ]
            })
            .collect()
    }
}
