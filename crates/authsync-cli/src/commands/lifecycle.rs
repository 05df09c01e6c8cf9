use std::path::Path;

use anyhow::{Result, bail};
use colored::Colorize;

use authsync_core::{ConfigMap, keys};
use authsync_reconciler::{Diagnostic, MapResourceData, ResourceData, has_errors};

use super::Session;
use crate::output::{print_diagnostics, print_success, print_warning};
use crate::state::{self, StateFile};

fn check(diagnostics: &[Diagnostic], action: &str) -> Result<()> {
    print_diagnostics(diagnostics);
    if has_errors(diagnostics) {
        bail!("{action} failed");
    }
    Ok(())
}

fn persist(session: &Session, data: MapResourceData) -> Result<String> {
    let (id, attributes) = data.into_state();
    state::save(&session.state_path, &StateFile {
        id: id.clone(),
        attributes,
    })?;
    Ok(id)
}

fn tracked(session: &Session) -> Result<StateFile> {
    match state::load(&session.state_path)? {
        Some(state) if !state.id.is_empty() => Ok(state),
        _ => bail!(
            "No auth method tracked in {}. Run apply or import first",
            session.state_path.display()
        ),
    }
}

pub async fn apply(session: &Session, file: &Path) -> Result<()> {
    let desired = state::load_desired(file)?;
    let previous = state::load(&session.state_path)?.filter(|s| !s.id.is_empty());

    match previous {
        None => {
            let mut data = MapResourceData::new("", ConfigMap::new(), desired);
            check(&session.resource.create(&session.cancel, &mut data).await, "Create")?;
            let id = persist(session, data)?;
            print_success(&format!("Created auth method {}", id.cyan()));
        }
        Some(previous) => {
            let mut data = MapResourceData::new(previous.id, previous.attributes, desired);
            let before = data.get_field(keys::VERSION);
            check(&session.resource.update(&session.cancel, &mut data).await, "Update")?;
            let unchanged = data.get_field(keys::VERSION) == before;
            let id = persist(session, data)?;
            if unchanged {
                print_success(&format!("Auth method {} is up to date", id.cyan()));
            } else {
                print_success(&format!("Updated auth method {}", id.cyan()));
            }
        }
    }
    Ok(())
}

pub async fn refresh(session: &Session) -> Result<()> {
    let previous = tracked(session)?;
    let mut data =
        MapResourceData::new(previous.id.clone(), previous.attributes.clone(), previous.attributes);
    check(&session.resource.read(&session.cancel, &mut data).await, "Refresh")?;

    if data.id().is_empty() {
        state::remove(&session.state_path)?;
        print_warning(&format!(
            "Auth method {} no longer exists; local state cleared",
            previous.id
        ));
        return Ok(());
    }
    let id = persist(session, data)?;
    print_success(&format!("Refreshed auth method {}", id.cyan()));
    Ok(())
}

pub async fn destroy(session: &Session) -> Result<()> {
    let previous = tracked(session)?;
    let mut data =
        MapResourceData::new(previous.id.clone(), previous.attributes.clone(), previous.attributes);
    check(&session.resource.delete(&session.cancel, &mut data).await, "Destroy")?;
    state::remove(&session.state_path)?;
    print_success(&format!("Destroyed auth method {}", previous.id.cyan()));
    Ok(())
}

pub async fn import(session: &Session, id: &str) -> Result<()> {
    if let Some(existing) = state::load(&session.state_path)?.filter(|s| !s.id.is_empty()) {
        bail!(
            "{} already tracks auth method {}",
            session.state_path.display(),
            existing.id
        );
    }
    let mut data = MapResourceData::for_import(id);
    check(&session.resource.import(&session.cancel, &mut data).await, "Import")?;
    let id = persist(session, data)?;
    print_success(&format!("Imported auth method {}", id.cyan()));
    Ok(())
}
