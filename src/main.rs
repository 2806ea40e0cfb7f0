use log::info;
use pipe_core::InMemoryStep;
use pipe_model::{Segment, MODEL_GLOBAL};
use pipeflow_rust::session::{FUNCTIONS_CONTAINER, LAYOUT_CONTAINER};
use pipeflow_rust::{AppResult, Session, CONFIG};

/// Ciclo completo: cargar estado, editar el modelo, propagar invalidaciones
/// al runner y persistir.
fn main() -> AppResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = &*CONFIG;
    info!("state dir: {}", config.state_dir.display());

    let mut session = Session::new(config);
    session.load()?;

    // Modelo inicial (si el estado estaba vacío)
    if session.model()?.segments.is_empty() {
        session.edit_model(|binary| {
                   binary.architecture = "x86_64".into();
                   binary.add_segment(Segment::code(".text", 0x1000, 0x1000))?;
                   binary.add_segment(Segment::data(".data", 0x4000, 0x200))?;
                   binary.add_function(0x1000, "main")?;
                   binary.add_function(0x1200, "helper")?;
                   binary.entry_point = Some(0x1000);
                   Ok(())
               })?;
    }

    // Artefactos cacheados como si el pipeline ya hubiese corrido
    let functions: Vec<String> = session.model()?.functions.keys().cloned().collect();
    let lifted = functions.iter().flat_map(|f| [format!("{f}:cfg"), format!("{f}:asm")]);
    let decompiled = functions.iter().map(|f| format!("{f}:c"));
    session.runner_mut()
           .add_step(InMemoryStep::new("lift").with_targets(FUNCTIONS_CONTAINER, lifted)
                                              .with_targets(LAYOUT_CONTAINER, ["segments"]));
    session.runner_mut()
           .add_step(InMemoryStep::new("decompile").with_predecessor("lift")
                                                   .with_targets(FUNCTIONS_CONTAINER, decompiled));

    let applied = session.edit_model(|binary| {
                             let first = binary.functions.values().map(|f| f.entry).next();
                             match first {
                                 Some(entry) => binary.rename_function(entry, "entry"),
                                 None => Ok(()),
                             }
                         })?;
    println!("[rename] invalidated:");
    for (step, containers) in &applied {
        for (container, targets) in containers {
            println!("  {step}/{container}: {targets:?}");
        }
    }

    if session.model()?.segment_at(0x5000).is_none() {
        let applied = session.edit_model(|binary| binary.add_segment(Segment::data(".bss", 0x5000, 0x80)))?;
        println!("[segment] invalidated: {applied:?}");
    }

    session.save()?;
    for (name, fingerprint) in session.store().fingerprints()? {
        println!("{name}: {fingerprint}");
    }
    println!("{} stored under {}",
             MODEL_GLOBAL,
             session.store().context_dir(session.root()).display());
    Ok(())
}
