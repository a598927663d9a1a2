use clap::{Arg, ArgAction, Command};
use eframe::egui;

use kg_viewer::graph_utils::layout::{LayoutKind, ViewMode};
use kg_viewer::gui::frontend::ViewerApp;
use kg_viewer::loader::DataSource;
use kg_viewer::persistence::settings::AppSettings;
use kg_viewer::viewer::xr::{NativeXr, SimulatedXr, XrRuntime};

fn main() -> eframe::Result {
    env_logger::init();

    let matches = Command::new("KG-Viewer")
        .about("Interactive 3D knowledge graph viewer")
        .arg(Arg::new("source").value_name("SOURCE").help("Graph JSON file path or http(s) URL"))
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_parser(["desktop", "ar"])
                .help("Initial view mode"),
        )
        .arg(
            Arg::new("layout")
                .long("layout")
                .value_parser(["tiered", "force"])
                .help("Node placement strategy"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("Layout jitter seed"),
        )
        .arg(
            Arg::new("force_ar")
                .long("force-ar")
                .action(ArgAction::SetTrue)
                .help("Allow AR mode on screen without an XR device"),
        )
        .get_matches();

    let mut settings = AppSettings::load().unwrap_or_else(|e| {
        log::warn!("using default settings: {}", e);
        AppSettings::default()
    });
    if let Some(layout) = matches.get_one::<String>("layout") {
        settings.layout = if layout == "force" { LayoutKind::Force } else { LayoutKind::Tiered };
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        settings.layout_seed = *seed;
    }
    let mode = match matches.get_one::<String>("mode").map(String::as_str) {
        Some("ar") => ViewMode::Ar,
        Some(_) => ViewMode::Desktop,
        None => settings.mode,
    };

    let source = match matches.get_one::<String>("source").or(settings.default_source.as_ref()) {
        Some(raw) => match raw.parse::<DataSource>() {
            Ok(src) => Some(src),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        },
        None => None,
    };

    let xr: Box<dyn XrRuntime> = if matches.get_flag("force_ar") {
        log::info!("AR preview enabled without an XR device");
        Box::new(SimulatedXr)
    } else {
        Box::new(NativeXr)
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 760.0])
            .with_min_inner_size([640.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "KG-Viewer",
        options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(&cc.egui_ctx, settings, source, mode, xr)) as Box<dyn eframe::App>)),
    )
}
