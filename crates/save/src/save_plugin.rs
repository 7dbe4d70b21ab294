use std::path::PathBuf;

use bevy::prelude::*;
use units::{MigrationContext, SettingsChanged};

use crate::settings_file::{read_settings, write_settings};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Where the unit settings live on disk.
#[derive(Resource, Debug, Clone)]
pub struct SettingsPath(pub PathBuf);

impl Default for SettingsPath {
    fn default() -> Self {
        Self(PathBuf::from("more_citizen_units.cfg"))
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Loads unit settings before anything reads them and writes them back
/// whenever they change. Requires `UnitsPlugin`.
pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SettingsPath>();

        // PreStartup, so the capacity patches applied at Startup already see
        // the stored settings.
        app.add_systems(PreStartup, load_settings);
        app.add_systems(Update, persist_settings);
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn load_settings(path: Res<SettingsPath>, mut ctx: ResMut<MigrationContext>) {
    match read_settings(&path.0) {
        Ok(Some(settings)) => {
            info!("Loaded unit settings from {}", path.0.display());
            ctx.settings = settings;
        }
        Ok(None) => {
            info!(
                "No unit settings at {}, using defaults",
                path.0.display()
            );
        }
        Err(e) => {
            warn!(
                "Ignoring unit settings at {}: {e}. Using defaults",
                path.0.display()
            );
        }
    }
}

/// Writes the most recent settings seen this frame.
fn persist_settings(path: Res<SettingsPath>, mut events: EventReader<SettingsChanged>) {
    let Some(SettingsChanged(settings)) = events.read().last().copied() else {
        return;
    };
    if let Err(e) = write_settings(&path.0, &settings) {
        error!("Failed to save unit settings to {}: {e}", path.0.display());
    }
}
