//! Simulation uniforms and named control parameters.
//!
//! Every update program sees one uniform struct: a fixed header
//! (`time`, `delta_time`, `grid_size`, `particle_count`) followed by the
//! named scalar parameters in registration order. The parameters are owned
//! here and read fresh on every step, so a value changed between two steps
//! only ever affects the later one.
//!
//! # Example
//!
//! ```ignore
//! let mut params = ControlParams::new();
//! params.set("strength", 4.0f32);
//! params.set("frequency", 0.5f32);
//! // In WGSL: params.strength, params.frequency
//! ```

use std::collections::HashMap;

use crate::error::SetupError;

/// Names reserved by the uniform header.
pub const HEADER_FIELDS: [&str; 4] = ["time", "delta_time", "grid_size", "particle_count"];

/// Supported parameter value types. All are four bytes wide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    I32(i32),
    U32(u32),
}

impl UniformValue {
    /// Get the WGSL type name for this value.
    pub fn wgsl_type(&self) -> &'static str {
        match self {
            UniformValue::F32(_) => "f32",
            UniformValue::I32(_) => "i32",
            UniformValue::U32(_) => "u32",
        }
    }

    /// Value as `f32`, converting integers.
    pub fn as_f32(&self) -> f32 {
        match *self {
            UniformValue::F32(v) => v,
            UniformValue::I32(v) => v as f32,
            UniformValue::U32(v) => v as f32,
        }
    }

    /// `self` converted to the variant of `slot`. Floats truncate toward
    /// zero and saturate when stored into integer slots.
    pub fn converted_to(&self, slot: &UniformValue) -> UniformValue {
        match (*slot, *self) {
            (UniformValue::F32(_), v) => UniformValue::F32(v.as_f32()),
            (UniformValue::I32(_), UniformValue::I32(v)) => UniformValue::I32(v),
            (UniformValue::I32(_), UniformValue::U32(v)) => UniformValue::I32(v.min(i32::MAX as u32) as i32),
            (UniformValue::I32(_), UniformValue::F32(v)) => UniformValue::I32(v as i32),
            (UniformValue::U32(_), UniformValue::U32(v)) => UniformValue::U32(v),
            (UniformValue::U32(_), UniformValue::I32(v)) => UniformValue::U32(v.max(0) as u32),
            (UniformValue::U32(_), UniformValue::F32(v)) => UniformValue::U32(v as u32),
        }
    }

    fn write_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            UniformValue::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            UniformValue::I32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            UniformValue::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::I32(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::U32(v)
    }
}

/// Named scalar uniforms exposed for external tuning.
#[derive(Clone, Debug, Default)]
pub struct ControlParams {
    /// Ordered list of (name, value) pairs.
    /// Order matters for WGSL struct layout.
    values: Vec<(String, UniformValue)>,
    /// Quick lookup by name.
    indices: HashMap<String, usize>,
}

impl ControlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a parameter.
    ///
    /// The first `set` of a name fixes its WGSL type. Later values are
    /// converted into that type, since the composed shader keeps reading the
    /// field as declared.
    pub fn set<V: Into<UniformValue>>(&mut self, name: &str, value: V) {
        let value = value.into();
        if let Some(&idx) = self.indices.get(name) {
            let slot = &mut self.values[idx].1;
            if slot.wgsl_type() != value.wgsl_type() {
                log::debug!(
                    "Converting {} value for parameter '{}' to {}",
                    value.wgsl_type(),
                    name,
                    slot.wgsl_type()
                );
            }
            *slot = value.converted_to(slot);
        } else {
            let idx = self.values.len();
            self.values.push((name.to_string(), value));
            self.indices.insert(name.to_string(), idx);
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with<V: Into<UniformValue>>(mut self, name: &str, value: V) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.indices.get(name).map(|&idx| &self.values[idx].1)
    }

    /// Mutable `f32` slot for UI widgets. `None` for unknown or non-float
    /// parameters.
    pub fn f32_mut(&mut self, name: &str) -> Option<&mut f32> {
        let idx = *self.indices.get(name)?;
        match &mut self.values[idx].1 {
            UniformValue::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Check every name is a usable WGSL field that does not shadow the
    /// header.
    pub fn validate(&self) -> Result<(), SetupError> {
        for (name, _) in &self.values {
            if !is_identifier(name) || HEADER_FIELDS.contains(&name.as_str()) {
                return Err(SetupError::InvalidName(name.clone()));
            }
        }
        Ok(())
    }

    /// WGSL struct declaration for the full uniform block.
    pub(crate) fn to_wgsl_struct(&self) -> String {
        let mut code = String::from(
            "struct SimParams {\n    time: f32,\n    delta_time: f32,\n    grid_size: u32,\n    particle_count: u32,\n",
        );
        for (name, value) in &self.values {
            code.push_str(&format!("    {}: {},\n", name, value.wgsl_type()));
        }
        code.push_str("};\n");
        code
    }

    /// Serialize header plus parameters, padded to 16 bytes.
    pub(crate) fn to_bytes(&self, header: &SimHeader) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.byte_size());
        buf.extend_from_slice(bytemuck::bytes_of(header));
        for (_, value) in &self.values {
            value.write_bytes(&mut buf);
        }
        buf.resize(self.byte_size(), 0);
        buf
    }

    /// Uniform buffer size in bytes.
    pub(crate) fn byte_size(&self) -> usize {
        let raw = std::mem::size_of::<SimHeader>() + self.values.len() * 4;
        (raw + 15) & !15
    }
}

/// Fixed leading fields of the simulation uniform block.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimHeader {
    pub time: f32,
    pub delta_time: f32,
    pub grid_size: u32,
    pub particle_count: u32,
}

/// `[A-Za-z_][A-Za-z0-9_]*`, without the `__` prefix WGSL reserves.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    if name == "_" || name.starts_with("__") {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
