//! Rendering parameters forwarded to the conversion service.
//!
//! [`ConversionParameters`] mirrors the JSON object the service expects in
//! the `params` query argument. Every field is optional: an absent field is
//! omitted from the JSON entirely and the service applies its own default.
//!
//! ```rust
//! use labelzpl::{ColorMode, ConversionParameters};
//!
//! let params = ConversionParameters::builder()
//!     .dpi(300)
//!     .rotation(90)
//!     .color_mode(ColorMode::Grayscale)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.to_json().unwrap(), r#"{"dpi":300,"rotation":90,"colorMode":"GRAYSCALE"}"#);
//! ```

use crate::error::LabelZplError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Printer resolutions offered by the settings form.
pub const RECOMMENDED_DPI: [u32; 3] = [203, 300, 600];

/// Scaling, darkness and colour mode pinned by the declaration preset.
pub const DECLARATION_PRESET: PresetValues = PresetValues {
    scaling: 48,
    darkness: 80,
    color_mode: ColorMode::Bw,
};

/// Values restored when the declaration preset is switched off.
pub const STANDARD_PRESET: PresetValues = PresetValues {
    scaling: 100,
    darkness: 90,
    color_mode: ColorMode::Bw,
};

/// The triple of fields a preset controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetValues {
    pub scaling: u32,
    pub darkness: u32,
    pub color_mode: ColorMode,
}

/// Parameters for one conversion request.
///
/// Built via [`ConversionParameters::builder()`], or start from
/// [`ConversionParameters::standard()`] for the form defaults.
/// `Default` is the empty object `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionParameters {
    /// Physical label size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelSize>,

    /// PDF-specific options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfOptions>,

    /// ZPL output options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zpl: Option<ZplOptions>,

    /// Template data rows, forwarded as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<serde_json::Map<String, serde_json::Value>>>,

    /// Printer resolution. Form default: 203.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,

    /// Rotation in degrees, 0–360.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<u32>,

    /// Scaling in percent, 1–200.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<ColorMode>,

    /// Darkness in percent, 1–100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub darkness: Option<u32>,

    /// Offset of the rendered image on the label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSize {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_mode: Option<ConversionMode>,

    /// Page to convert. Absent means the service's default page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZplOptions {
    /// ZPL mnemonics (e.g. `^PQ`) to drop from the generated output.
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub commands_to_ignore: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// How the service interprets a PDF page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConversionMode {
    /// Rasterise the page and dither it. (default)
    #[default]
    Image,
    /// Translate PDF drawing operators into ZPL primitives.
    Native,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorMode {
    Grayscale,
    /// Black and white. (default)
    #[default]
    Bw,
}

impl ConversionParameters {
    /// Create a new builder starting from the empty parameter set.
    pub fn builder() -> ConversionParametersBuilder {
        ConversionParametersBuilder {
            params: Self::default(),
        }
    }

    /// The settings form defaults: 203 DPI, 180° rotation, 100 % scaling,
    /// black and white at 90 % darkness, PDF pages rasterised as images.
    pub fn standard() -> Self {
        Self {
            pdf: Some(PdfOptions {
                conversion_mode: Some(ConversionMode::Image),
                page_number: None,
            }),
            dpi: Some(203),
            rotation: Some(180),
            scaling: Some(STANDARD_PRESET.scaling),
            color_mode: Some(STANDARD_PRESET.color_mode),
            darkness: Some(STANDARD_PRESET.darkness),
            ..Self::default()
        }
    }

    /// Serialise to the compact JSON sent in the `params` query argument.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Check every present field against its domain.
    pub fn validate(&self) -> Result<(), LabelZplError> {
        fn out_of_range(name: &str, value: u32, lo: u32, hi: u32) -> LabelZplError {
            LabelZplError::InvalidParameters(format!("{name} must be {lo}–{hi}, got {value}"))
        }

        if let Some(dpi) = self.dpi {
            if dpi == 0 {
                return Err(LabelZplError::InvalidParameters(
                    "dpi must be positive".into(),
                ));
            }
        }
        if let Some(r) = self.rotation {
            if r > 360 {
                return Err(out_of_range("rotation", r, 0, 360));
            }
        }
        if let Some(s) = self.scaling {
            if !(1..=200).contains(&s) {
                return Err(out_of_range("scaling", s, 1, 200));
            }
        }
        if let Some(d) = self.darkness {
            if !(1..=100).contains(&d) {
                return Err(out_of_range("darkness", d, 1, 100));
            }
        }
        if let Some(label) = self.label {
            for (name, value) in [("label width", label.width), ("label height", label.height)] {
                if let Some(v) = value {
                    if !(v.is_finite() && v > 0.0) {
                        return Err(LabelZplError::InvalidParameters(format!(
                            "{name} must be a positive number, got {v}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Pin or release the declaration preset.
///
/// With `enabled`, scaling, darkness and colour mode take the values of
/// [`DECLARATION_PRESET`]; without it they return to [`STANDARD_PRESET`].
/// All other fields pass through untouched.
pub fn apply_declaration_preset(params: ConversionParameters, enabled: bool) -> ConversionParameters {
    let preset = if enabled {
        DECLARATION_PRESET
    } else {
        STANDARD_PRESET
    };
    ConversionParameters {
        scaling: Some(preset.scaling),
        darkness: Some(preset.darkness),
        color_mode: Some(preset.color_mode),
        ..params
    }
}

/// Builder for [`ConversionParameters`].
#[derive(Debug)]
pub struct ConversionParametersBuilder {
    params: ConversionParameters,
}

impl ConversionParametersBuilder {
    /// Start from an existing parameter set instead of the empty one.
    pub fn from_params(params: ConversionParameters) -> Self {
        Self { params }
    }

    pub fn label_width(mut self, width: f64) -> Self {
        self.params.label.get_or_insert_with(LabelSize::default).width = Some(width);
        self
    }

    pub fn label_height(mut self, height: f64) -> Self {
        self.params.label.get_or_insert_with(LabelSize::default).height = Some(height);
        self
    }

    pub fn conversion_mode(mut self, mode: ConversionMode) -> Self {
        self.params.pdf.get_or_insert_with(PdfOptions::default).conversion_mode = Some(mode);
        self
    }

    pub fn page_number(mut self, page: u32) -> Self {
        self.params.pdf.get_or_insert_with(PdfOptions::default).page_number = Some(page);
        self
    }

    pub fn ignore_command(mut self, command: impl Into<String>) -> Self {
        self.params
            .zpl
            .get_or_insert_with(ZplOptions::default)
            .commands_to_ignore
            .insert(command.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.params.dpi = Some(dpi);
        self
    }

    pub fn rotation(mut self, degrees: u32) -> Self {
        self.params.rotation = Some(degrees);
        self
    }

    pub fn scaling(mut self, percent: u32) -> Self {
        self.params.scaling = Some(percent);
        self
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.params.color_mode = Some(mode);
        self
    }

    pub fn darkness(mut self, percent: u32) -> Self {
        self.params.darkness = Some(percent);
        self
    }

    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.params.position = Some(Position { x, y });
        self
    }

    pub fn data_row(mut self, row: serde_json::Map<String, serde_json::Value>) -> Self {
        self.params.data.get_or_insert_with(Vec::new).push(row);
        self
    }

    /// Apply the declaration preset on top of whatever was set so far.
    pub fn declaration_mode(mut self, enabled: bool) -> Self {
        self.params = apply_declaration_preset(self.params, enabled);
        self
    }

    /// Build the parameters, validating value domains.
    pub fn build(self) -> Result<ConversionParameters, LabelZplError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_serialises_to_empty_object() {
        assert_eq!(ConversionParameters::default().to_json().unwrap(), "{}");
    }

    #[test]
    fn standard_matches_form_defaults() {
        let json: serde_json::Value =
            serde_json::from_str(&ConversionParameters::standard().to_json().unwrap()).unwrap();
        assert_eq!(json["dpi"], 203);
        assert_eq!(json["rotation"], 180);
        assert_eq!(json["scaling"], 100);
        assert_eq!(json["colorMode"], "BW");
        assert_eq!(json["darkness"], 90);
        assert_eq!(json["pdf"]["conversionMode"], "IMAGE");
        assert!(json.get("label").is_none());
    }

    #[test]
    fn nested_fields_use_wire_names() {
        let params = ConversionParameters::builder()
            .label_width(100.0)
            .label_height(150.0)
            .conversion_mode(ConversionMode::Native)
            .page_number(2)
            .ignore_command("^PQ")
            .ignore_command("^MM")
            .position(1.5, 2.0)
            .build()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&params.to_json().unwrap()).unwrap();
        assert_eq!(json["label"]["width"], 100.0);
        assert_eq!(json["label"]["height"], 150.0);
        assert_eq!(json["pdf"]["conversionMode"], "NATIVE");
        assert_eq!(json["pdf"]["pageNumber"], 2);
        assert_eq!(json["zpl"]["commandsToIgnore"], serde_json::json!(["^MM", "^PQ"]));
        assert_eq!(json["position"]["x"], 1.5);
    }

    #[test]
    fn builder_rejects_out_of_domain_values() {
        assert!(ConversionParameters::builder().rotation(361).build().is_err());
        assert!(ConversionParameters::builder().scaling(0).build().is_err());
        assert!(ConversionParameters::builder().scaling(201).build().is_err());
        assert!(ConversionParameters::builder().darkness(0).build().is_err());
        assert!(ConversionParameters::builder().darkness(101).build().is_err());
        assert!(ConversionParameters::builder().dpi(0).build().is_err());
        assert!(ConversionParameters::builder().label_width(-1.0).build().is_err());
        assert!(ConversionParameters::builder()
            .rotation(360)
            .scaling(200)
            .darkness(1)
            .build()
            .is_ok());
    }

    #[test]
    fn declaration_preset_pins_three_fields() {
        let base = ConversionParameters::standard();
        let on = apply_declaration_preset(base.clone(), true);
        assert_eq!(on.scaling, Some(48));
        assert_eq!(on.darkness, Some(80));
        assert_eq!(on.color_mode, Some(ColorMode::Bw));
        // untouched
        assert_eq!(on.dpi, base.dpi);
        assert_eq!(on.rotation, base.rotation);

        let off = apply_declaration_preset(on, false);
        assert_eq!(off.scaling, Some(100));
        assert_eq!(off.darkness, Some(90));
        assert_eq!(off, base);
    }

    #[test]
    fn preset_is_idempotent() {
        let once = apply_declaration_preset(ConversionParameters::default(), true);
        let twice = apply_declaration_preset(once.clone(), true);
        assert_eq!(once, twice);
    }

    #[test]
    fn deserialises_partial_object() {
        let params: ConversionParameters =
            serde_json::from_str(r#"{"dpi":600,"zpl":{}}"#).unwrap();
        assert_eq!(params.dpi, Some(600));
        assert!(params.zpl.unwrap().commands_to_ignore.is_empty());
    }
}
