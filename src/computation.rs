//! Feedback computation description.
//!
//! A [`Computation`] names the variables of a feedback simulation, their
//! update programs, seed textures and dependencies, plus the control
//! parameters every program sees. It is pure data: nothing touches the GPU
//! until [`FeedbackSimulator::new`](crate::gpu::FeedbackSimulator::new)
//! consumes it, and every configuration mistake is reported by
//! [`Computation::validate`] before any resource is created.
//!
//! # Example
//!
//! ```ignore
//! let mut computation = Computation::new(grid_size, particle_count);
//! computation.add_variable(
//!     Variable::new("particles", FLOW_FIELD_PROGRAM, seed)
//!         .with_dependencies(["particles"])
//!         .lock_seed_channel(),
//! )?;
//! computation.params_mut().set("strength", 4.0f32);
//! ```

use std::collections::HashSet;

use crate::error::SetupError;
use crate::program::{compose_update_shader, validate_wgsl};
use crate::state_texture::StateTexture;
use crate::uniforms::{is_identifier, ControlParams};

/// One feedback quantity and the program that advances it.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    program: String,
    seed: StateTexture,
    dependencies: Vec<String>,
    lock_seed_channel: bool,
}

impl Variable {
    /// A variable with no dependencies.
    pub fn new(name: impl Into<String>, program: impl Into<String>, seed: StateTexture) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            seed,
            dependencies: Vec::new(),
            lock_seed_channel: false,
        }
    }

    /// Variables whose previous generation this program reads.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Keep channel 3 at its seeded value whatever the program returns.
    pub fn lock_seed_channel(mut self) -> Self {
        self.lock_seed_channel = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn seed(&self) -> &StateTexture {
        &self.seed
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn seed_channel_locked(&self) -> bool {
        self.lock_seed_channel
    }
}

/// A set of variables simulated together on one square grid.
#[derive(Debug, Clone)]
pub struct Computation {
    size: u32,
    particle_count: u32,
    variables: Vec<Variable>,
    params: ControlParams,
}

impl Computation {
    /// `size` is the grid edge; `particle_count` is exposed to programs as
    /// `params.particle_count`.
    pub fn new(size: u32, particle_count: u32) -> Self {
        Self {
            size,
            particle_count,
            variables: Vec::new(),
            params: ControlParams::new(),
        }
    }

    /// Register a variable. Names must be unique.
    pub fn add_variable(&mut self, variable: Variable) -> Result<(), SetupError> {
        if self.variables.iter().any(|v| v.name == variable.name) {
            return Err(SetupError::DuplicateVariable(variable.name));
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Replace the dependency list of an already registered variable.
    ///
    /// Dependencies themselves are checked by [`validate`](Self::validate),
    /// so they may be declared before the variables they name.
    pub fn set_dependencies<I, S>(&mut self, name: &str, dependencies: I) -> Result<(), SetupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let variable = self
            .variables
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| SetupError::UnknownVariable(name.to_string()))?;
        variable.dependencies = dependencies.into_iter().map(Into::into).collect();
        Ok(())
    }

    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ControlParams {
        &mut self.params
    }

    /// Builder-style parameter registration.
    pub fn with_param<V: Into<crate::uniforms::UniformValue>>(mut self, name: &str, value: V) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Check everything that does not need a device.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.size == 0 {
            return Err(SetupError::ZeroGrid);
        }
        if (self.particle_count as u64) > (self.size as u64) * (self.size as u64) {
            return Err(SetupError::Capacity {
                count: self.particle_count,
                size: self.size,
            });
        }
        if self.variables.is_empty() {
            return Err(SetupError::NoVariables);
        }
        self.params.validate()?;

        let names: HashSet<&str> = self.variables.iter().map(|v| v.name.as_str()).collect();
        for variable in &self.variables {
            if !is_identifier(&variable.name) || variable.name == "base" {
                return Err(SetupError::InvalidName(variable.name.clone()));
            }
            if variable.seed.size() != self.size {
                return Err(SetupError::SeedSize {
                    variable: variable.name.clone(),
                    actual: variable.seed.size(),
                    expected: self.size,
                });
            }
            for dependency in &variable.dependencies {
                if !names.contains(dependency.as_str()) {
                    return Err(SetupError::UnknownDependency {
                        variable: variable.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate the description, then compose and validate every variable's
    /// compute shader, in registration order.
    pub fn compile(&self) -> Result<Vec<String>, SetupError> {
        self.validate()?;
        self.variables
            .iter()
            .map(|variable| {
                let code = compose_update_shader(
                    &variable.program,
                    &variable.dependencies,
                    &self.params,
                    variable.lock_seed_channel,
                );
                validate_wgsl(&code, &format!("update program '{}'", variable.name))?;
                Ok(code)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::FLOW_FIELD_PROGRAM;

    fn flow(size: u32) -> Computation {
        let mut computation = Computation::new(size, size * size)
            .with_param("influence", 0.2f32)
            .with_param("strength", 4.0f32)
            .with_param("frequency", 0.5f32);
        computation
            .add_variable(
                Variable::new("particles", FLOW_FIELD_PROGRAM, StateTexture::zeroed(size))
                    .with_dependencies(["particles"])
                    .lock_seed_channel(),
            )
            .unwrap();
        computation
    }

    #[test]
    fn test_flow_computation_compiles() {
        let shaders = flow(4).compile().unwrap();
        assert_eq!(shaders.len(), 1);
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let mut computation = flow(4);
        computation.set_dependencies("particles", ["velocity"]).unwrap();
        let err = computation.validate().unwrap_err();
        assert!(matches!(
            err,
            SetupError::UnknownDependency { ref dependency, .. } if dependency == "velocity"
        ));
    }

    #[test]
    fn test_set_dependencies_on_missing_variable() {
        let mut computation = flow(4);
        assert!(matches!(
            computation.set_dependencies("velocity", ["particles"]),
            Err(SetupError::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let mut computation = flow(2);
        let again = Variable::new("particles", FLOW_FIELD_PROGRAM, StateTexture::zeroed(2));
        assert!(matches!(
            computation.add_variable(again),
            Err(SetupError::DuplicateVariable(_))
        ));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(Computation::new(0, 0).validate(), Err(SetupError::ZeroGrid)));
        assert!(matches!(Computation::new(2, 4).validate(), Err(SetupError::NoVariables)));
        assert!(matches!(
            Computation::new(2, 5).validate(),
            Err(SetupError::Capacity { count: 5, size: 2 })
        ));

        let mut wrong_seed = Computation::new(3, 9);
        wrong_seed
            .add_variable(Variable::new("particles", FLOW_FIELD_PROGRAM, StateTexture::zeroed(2)))
            .unwrap();
        assert!(matches!(
            wrong_seed.validate(),
            Err(SetupError::SeedSize { actual: 2, expected: 3, .. })
        ));

        let mut bad_name = Computation::new(2, 4);
        bad_name
            .add_variable(Variable::new("my particles", "", StateTexture::zeroed(2)))
            .unwrap();
        assert!(matches!(bad_name.validate(), Err(SetupError::InvalidName(_))));
    }

    #[test]
    fn test_program_error_surfaces_at_compile() {
        let mut computation = Computation::new(2, 4);
        computation
            .add_variable(Variable::new(
                "particles",
                "fn update(coord: vec2<i32>, uv: vec2<f32>) -> vec4<f32> { return read_missing(coord); }",
                StateTexture::zeroed(2),
            ))
            .unwrap();
        let err = computation.compile().unwrap_err();
        assert!(matches!(err, SetupError::ShaderCompile { ref label, .. } if label.contains("particles")));
    }
}
