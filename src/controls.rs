//! Tunable scene controls.
//!
//! The values an operator can change while the scene runs. The session
//! copies them into the live uniforms and the snow field every frame, so
//! whatever is here is what the next step and draw see.

use crate::preset::ModelPreset;

#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub influence: f32,
    pub strength: f32,
    pub frequency: f32,
    pub particle_size: f32,
    pub snow_enabled: bool,
    pub snow_speed: f32,
    pub snow_size: f32,
}

impl Controls {
    pub fn from_preset(preset: &ModelPreset) -> Self {
        Self {
            influence: preset.influence,
            strength: preset.strength,
            frequency: preset.frequency,
            particle_size: preset.particle_size,
            snow_enabled: preset.snow.enabled,
            snow_speed: preset.snow.speed,
            snow_size: preset.snow.size,
        }
    }

    /// Panel with one slider per value.
    #[cfg(feature = "egui")]
    pub fn ui(&mut self, ctx: &egui::Context) {
        egui::Window::new("Controls")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Particles");
                ui.add(egui::Slider::new(&mut self.influence, 0.0..=1.0).text("Influence"));
                ui.add(egui::Slider::new(&mut self.strength, 0.0..=10.0).text("Strength"));
                ui.add(egui::Slider::new(&mut self.frequency, 0.0..=2.0).text("Frequency"));
                ui.add(egui::Slider::new(&mut self.particle_size, 0.05..=2.0).text("Size"));

                ui.separator();
                ui.heading("Snow");
                ui.checkbox(&mut self.snow_enabled, "Enabled");
                ui.add(egui::Slider::new(&mut self.snow_speed, 0.05..=1.0).text("Speed"));
                ui.add(egui::Slider::new(&mut self.snow_size, 0.1..=5.0).text("Size"));
            });
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::from_preset(&ModelPreset::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_preset() {
        let mut preset = ModelPreset::default();
        preset.strength = 7.5;
        preset.snow.enabled = false;
        let controls = Controls::from_preset(&preset);
        assert_eq!(controls.strength, 7.5);
        assert!(!controls.snow_enabled);
        assert_eq!(controls.frequency, 0.5);
    }
}
