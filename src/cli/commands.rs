//! Subcommand handlers.

use std::io;

use screenrec::config::{self, Config, Settings, DEFAULT_CONFIG_TEMPLATE};
use screenrec::deps;
use screenrec::devices::{self, CaptureDevice, DeviceKind};
use screenrec::displays;
use screenrec::encoder;
use screenrec::error::RecorderError;
use screenrec::modes;
use screenrec::permissions::{self, PermissionCheck, PermissionProber};
use screenrec::platform::{MacPlatform, Toolkit};
use screenrec::session;

use super::args::{ConfigAction, RecordArgs};

/// Plan the capture job and run (or print) it.
pub fn record(args: &RecordArgs, cfg: &Config) -> Result<(), RecorderError> {
    let settings = Settings::merge(args.overrides(), cfg)?;

    if args.skip_deps {
        log::debug!("Skipping dependency check");
    } else {
        deps::check_dependencies(&deps::REQUIRED)?;
    }

    let platform = MacPlatform::new(&settings);
    let prober = PermissionProber::new(&settings);
    let toolkit = Toolkit {
        devices: &platform,
        displays: &platform,
        screenshots: &platform,
        pointer: &platform,
        permission: &prober,
    };

    let stdin = io::stdin();
    let planned = session::plan(
        &settings,
        args.selection_mode(),
        &toolkit,
        &mut stdin.lock(),
        &mut io::stdout(),
    )?;

    if args.dry_run {
        println!("{}", planned.descriptor.command_line());
        return Ok(());
    }

    if let Err(e) = encoder::setup_ctrlc_handler() {
        log::warn!("Could not install Ctrl+C handler: {}", e);
    }
    encoder::run(&planned.descriptor)
}

/// List devices, marking screen devices.
pub fn list_devices(cfg: &Config) -> Result<(), RecorderError> {
    let settings = Settings::merge(Default::default(), cfg)?;
    let platform = MacPlatform::new(&settings);
    let list = devices::list_devices(&platform)?;
    devices::print_devices(&list, settings.screen_device_threshold);
    Ok(())
}

/// List the modes a device offers, as negotiation would see them.
pub fn list_modes(device: Option<u32>, cfg: &Config) -> Result<(), RecorderError> {
    let settings = Settings::merge(Default::default(), cfg)?;
    let platform = MacPlatform::new(&settings);
    let device = CaptureDevice::from_index(
        device.unwrap_or(settings.device),
        settings.screen_device_threshold,
    );

    let native = match device.kind {
        DeviceKind::Screen => displays::display_resolutions(&platform).first().copied(),
        DeviceKind::Camera => None,
    };
    let catalog = modes::list_modes(&device, native, &platform);

    let source = match catalog.source() {
        modes::CatalogSource::ReferenceTable => "screen reference table",
        modes::CatalogSource::DeviceQuery => "device query",
        modes::CatalogSource::SyntheticFallback => "fallback, device reported no modes",
    };
    println!("Modes for device {} ({}):", device.index, source);
    for mode in catalog.modes() {
        println!("  {} {} fps", mode.resolution, mode.frame_rate);
    }
    Ok(())
}

/// Report dependencies and permission state.
pub fn check(cfg: &Config) -> Result<(), RecorderError> {
    let settings = Settings::merge(Default::default(), cfg)?;

    println!("screenrec System Check");
    println!("{}", "=".repeat(40));
    let deps_ok = deps::print_dependency_report(&deps::REQUIRED);

    let status = PermissionProber::new(&settings).probe();
    permissions::print_permission_report(status);

    println!();
    if deps_ok && status.is_granted() {
        println!("All checks passed. screenrec is ready.");
    } else {
        println!("Some checks failed. See above for fixes.");
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, cfg: &Config) -> Result<(), RecorderError> {
    match action {
        ConfigAction::Show => {
            let settings = Settings::merge(Default::default(), cfg)?;
            println!("Current configuration:");
            println!("  Device: {}", settings.device);
            println!(
                "  Audio device: {}",
                settings.encoding.audio_device.as_deref().unwrap_or("none")
            );
            println!("  Screen device threshold: {}", settings.screen_device_threshold);
            println!("  Resolution: {}", settings.request.resolution);
            println!("  Frame rate: {}", settings.request.frame_rate);
            println!("  Codec: {}", settings.encoding.codec);
            println!("  CRF / preset: {} / {}", settings.encoding.crf, settings.encoding.preset);
            match settings.encoding.quality {
                Some(q) => println!("  Quality: {}", q),
                None => println!("  Quality: codec default"),
            }
            println!("  Permission probe: {:?}", settings.probe_timeout);
            println!("  Renderers: {}", settings.renderers.join(", "));
            println!();

            let config_path = config::default_path();
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            let config_path = config::default_path();
            let io_err = |e: io::Error| RecorderError::Io {
                path: config_path.clone(),
                source: e,
            };

            if config_path.exists() {
                eprintln!("Config file already exists: {}", config_path.display());
                eprintln!("Use 'screenrec config show' to view current settings.");
                return Ok(());
            }

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
            std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE).map_err(io_err)?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}
