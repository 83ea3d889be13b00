use panel_menu::cli::{self, Command, ParseArgsResult};
use panel_menu::menu::{search, IconRef, MenuItem, MenuModel};
use panel_menu::paths::DataPaths;
use panel_menu::registry::DesktopRegistry;
use panel_menu::settings::Settings;
use panel_menu::store::Category;
use panel_menu::sync::{Role, Surface};
use panel_menu::{logging, MenuContext};
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let invocation = match cli::parse(&args) {
        ParseArgsResult::Parsed(inv) => inv,
        ParseArgsResult::Usage(usage) => {
            eprintln!("{usage}");
            std::process::exit(2);
        }
    };

    let paths = DataPaths::resolve(invocation.data_dir)?;
    let settings = Settings::load(&paths.settings());
    let (settings, settings_error) = match settings {
        Ok(s) => (s, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));
    if let Some(e) = settings_error {
        tracing::error!(error = %e, "failed to load settings, using defaults");
    }

    let registry = DesktopRegistry::from_settings(settings.application_dirs.as_deref());
    let mut ctx = MenuContext::open(paths, settings, Box::new(registry))?;

    match invocation.command {
        Command::Show => print_menu(&MenuModel::build(&ctx)),
        Command::Search(query) => {
            for item in search(&ctx, &query) {
                print_item(&item);
            }
        }
        Command::Launch(id) => ctx.launch(&id)?,
        Command::Add { name, icon } => ctx.add_category(&name, icon.as_deref())?,
        Command::Rename { from, to } => {
            let current = ctx
                .categories()
                .get(&from)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no category named {from:?}"))?;
            let renamed = Category { name: to, ..current };
            ctx.update_category(Some(from.as_str()), renamed, None)?;
        }
        Command::Remove(name) => {
            ctx.remove_category(&name)?;
        }
        Command::Move { name, direction } => {
            if !ctx.move_category(&name, direction)? {
                println!("{name} cannot move further");
            }
        }
        Command::Assign {
            category,
            app_id,
            name,
        } => {
            if !ctx.registry().is_installed(&app_id) {
                anyhow::bail!("application {app_id} is not installed");
            }
            ctx.assign_app(&category, &app_id, name.as_deref().unwrap_or(""))?;
        }
        Command::Unassign { category, app_id } => {
            ctx.unassign_app(&category, &app_id)?;
        }
        Command::Watch => watch(ctx),
    }
    Ok(())
}

/// Run as a live surface until stdin closes.
fn watch(ctx: MenuContext) {
    print_menu(&MenuModel::build(&ctx));
    let mut surface = Surface::new(ctx, Role::Popup);
    let printer = surface.on_rebuild(|ctx| print_menu(&MenuModel::build(ctx)));
    surface.keep(printer);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        std::thread::spawn(move || {
            let mut sink = Vec::new();
            let _ = std::io::stdin().read_to_end(&mut sink);
            stop.store(true, Ordering::Relaxed);
        });
    }
    surface.run(&stop, Duration::from_millis(100));
    surface.teardown();
}

fn print_menu(model: &MenuModel) {
    for section in &model.sections {
        println!("[{}]", section.title);
        for item in &section.items {
            print_item(item);
        }
    }
}

fn print_item(item: &MenuItem) {
    let icon = match &item.icon {
        Some(IconRef::Custom(path)) => path.display().to_string(),
        Some(IconRef::Themed(name)) => name.clone(),
        None => String::new(),
    };
    println!("  {}\t{}\t{}", item.label, item.app_id, icon);
}
