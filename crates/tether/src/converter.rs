#![forbid(unsafe_code)]

//! Value converters for the binding pipeline.
//!
//! A converter is a pure mapping from a view-model value to a view value.
//! Reversible converters also map back, which is what a two-way binding (a
//! text field feeding its edits into the model) needs. Converters that need
//! setup receive their options once, when the conversion stage is built, and
//! the same instance then serves every emission through that stage.

/// Forward mapping `Value -> Converted`.
pub trait Converter {
    /// Input type (the observed value).
    type Value;
    /// Output type (what the consumer receives).
    type Converted;

    fn convert(&self, value: &Self::Value) -> Self::Converted;
}

/// A converter that can also map `Converted -> Value`.
pub trait ConverterReverse: Converter {
    fn convert_back(&self, value: &Self::Converted) -> Self::Value;
}

/// A converter built from caller-supplied options.
///
/// The options are opaque to the binding layer.
pub trait ConverterOption: Converter + Sized {
    type Options;

    fn with_options(options: Self::Options) -> Self;
}
