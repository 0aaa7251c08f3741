/// Code generation options
///
/// These mirror command line switches of the compiler driver and are passed by
/// shared reference through the whole code generation pipeline. Exactly one
/// float encoding is active at a time: `optimize_zero_floats` wins for values
/// equal to zero, then `use_half_float`, then raw IEEE-754.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Encode a float equal to `0.0` as a one byte signed integer zero
    /// instead of a full float payload.
    pub optimize_zero_floats: bool,

    /// Encode non-zero floats as a fixed-point `i16` of `value * 16.0`.
    ///
    /// This is the packed representation used by the earliest dialect. The
    /// mapping is lossy: values round toward zero with a granularity of
    /// 1/16.
    pub use_half_float: bool,

    /// Emit every label reference as a negated local offset, regardless of
    /// the owning script's type.
    pub use_local_offsets: bool,

    /// Prefix 8-char text labels with a type tag byte.
    ///
    /// The oldest target VM reads text labels without any tag; later ones
    /// expect the tag.
    pub has_text_label_prefix: bool,
}
