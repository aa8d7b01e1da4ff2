use clap::{App, Arg, ArgMatches, SubCommand};
use framebridge::{
    error::BridgeError,
    layout::{
        RegionView, BRIDGE_MAGIC, BUFFER_COUNT, CAMERA_OFFSET, CAMERA_SIZE,
        CLIENT_RESOLUTION_OFFSET, FRAME_HEADERS_OFFSET, FRAME_HEADER_SIZE, INPUT_QUEUE_CAPACITY,
        INPUT_QUEUE_OFFSET, INPUT_QUEUE_SIZE, LAYOUT_SIZE, LAYOUT_VERSION, MAGIC_OFFSET,
        MAX_SCENE_SIZE, MAX_UI_SIZE, PREAMBLE_SIZE, RENDERER_RESOLUTION_OFFSET, RESOLUTION_SIZE,
        SCENE_BUFFERS_OFFSET, UI_BUFFERS_OFFSET, VERSION_OFFSET,
    },
    Attachment, BridgeConfig, RegionConfig, ResolutionSide, Result, Role, SharedMemoryRegion,
};
use std::sync::{atomic::Ordering, Arc};

fn main() -> Result<()> {
    env_logger::init();

    let name_arg = Arg::with_name("name")
        .short("n")
        .long("name")
        .value_name("NAME")
        .help("Bridge session name")
        .required(true)
        .takes_value(true);
    let file_arg = Arg::with_name("file")
        .short("f")
        .long("file")
        .value_name("FILE")
        .help("Backing file (defaults to the temp directory)")
        .takes_value(true);

    let matches = App::new("framebridge-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Game client / renderer shared memory bridge tool")
        .subcommand(
            SubCommand::with_name("create")
                .about("Create and initialise a bridge region")
                .arg(name_arg.clone())
                .arg(file_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("inspect")
                .about("Print the state of an existing bridge region")
                .arg(name_arg.clone())
                .arg(file_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("release")
                .about("Clear role claims left by processes that exited without shutting down")
                .arg(name_arg)
                .arg(file_arg),
        )
        .subcommand(SubCommand::with_name("layout").about("Print the shared memory layout"))
        .get_matches();

    match matches.subcommand() {
        ("create", Some(create_matches)) => create_region(create_matches),
        ("inspect", Some(inspect_matches)) => inspect_region(inspect_matches),
        ("release", Some(release_matches)) => release_claims(release_matches),
        ("layout", Some(_)) => {
            print_layout();
            Ok(())
        }
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn bridge_config(matches: &ArgMatches, create: bool) -> Result<BridgeConfig> {
    let name = matches
        .value_of("name")
        .ok_or_else(|| BridgeError::invalid_parameter("name", "Missing session name"))?;

    let mut region = RegionConfig::new(name).with_create(create);
    if let Some(file) = matches.value_of("file") {
        region = region.with_file_path(file);
    }
    Ok(BridgeConfig::new(name).with_region(region))
}

fn create_region(matches: &ArgMatches) -> Result<()> {
    let config = bridge_config(matches, true)?;
    let attachment = Attachment::open(&config)?;
    let region = attachment.region();

    println!(
        "Created bridge '{}' ({} bytes, layout v{})",
        region.name(),
        region.view().len(),
        LAYOUT_VERSION
    );
    println!("  Path: {}", config.region.default_file_path().display());
    Ok(())
}

fn inspect_region(matches: &ArgMatches) -> Result<()> {
    let config = bridge_config(matches, false)?;
    config.validate()?;
    let mapping = Arc::new(SharedMemoryRegion::open(&config.region)?);

    // Check the preamble before attaching, which would initialise a blank region
    let raw = RegionView::new(mapping.clone())?;
    let magic = raw.load_u32(MAGIC_OFFSET, Ordering::Acquire)?;
    let version = raw.load_u32(VERSION_OFFSET, Ordering::Acquire)?;

    println!("Region '{}' ({} bytes)", mapping.name(), mapping.size());
    println!("  Magic:   {:#010x}", magic);
    println!("  Version: {}", version);
    if magic != BRIDGE_MAGIC {
        println!("  Not an initialised bridge region");
        return Ok(());
    }

    let attachment = Attachment::from_mapping(mapping, config.wait)?;
    let region = attachment.region();

    let claims = region.role_claims()?;
    let held: Vec<&str> = [Role::Client, Role::Renderer]
        .into_iter()
        .filter(|role| claims & role.bit() != 0)
        .map(Role::name)
        .collect();
    if held.is_empty() {
        println!("  Held roles: none");
    } else {
        println!("  Held roles: {}", held.join(", "));
    }

    let camera = region.camera()?;
    println!("\nCamera:");
    println!(
        "  Position: ({:.3}, {:.3}, {:.3})",
        camera.x, camera.y, camera.z
    );
    println!(
        "  Yaw/Pitch/Zoom: {:.3} / {:.3} / {:.3}",
        camera.yaw, camera.pitch, camera.zoom
    );

    println!("\nResolutions:");
    for (label, side) in [
        ("client", ResolutionSide::Client),
        ("renderer", ResolutionSide::Renderer),
    ] {
        let state = region.resolution_state(side)?;
        println!(
            "  {:<8} {}x{} (consumed: {})",
            label, state.resolution.width, state.resolution.height, state.consumed
        );
    }

    println!("\nFrames (active slot {}):", region.active_index()?);
    for slot in 0..BUFFER_COUNT {
        let header = region.frame_header(slot)?;
        println!(
            "  [{}] id {:>10}  ready {:<5}  consumed {:<5}  scene {:>9}  ui {:>9}",
            slot,
            header.frame_id,
            header.ready,
            header.consumed,
            header.scene_length,
            header.ui_length
        );
    }

    println!(
        "\nInput queue: {}/{} pending",
        region.input_queue_depth()?,
        INPUT_QUEUE_CAPACITY
    );
    Ok(())
}

fn release_claims(matches: &ArgMatches) -> Result<()> {
    let config = bridge_config(matches, false)?;
    let attachment = Attachment::open(&config)?;
    let region = attachment.region();

    let previous = region.role_claims()?;
    region.clear_role_claims()?;
    println!(
        "Cleared role claims of '{}' (was {:#04b})",
        region.name(),
        previous
    );
    Ok(())
}

fn print_layout() {
    println!("framebridge layout v{} ({} bytes)", LAYOUT_VERSION, LAYOUT_SIZE);
    println!("  {:>10}  {:>10}  Field", "Offset", "Size");
    let rows = [
        (MAGIC_OFFSET, PREAMBLE_SIZE, "preamble (magic, version, active index)"),
        (CAMERA_OFFSET, CAMERA_SIZE, "camera"),
        (CLIENT_RESOLUTION_OFFSET, RESOLUTION_SIZE, "client resolution"),
        (RENDERER_RESOLUTION_OFFSET, RESOLUTION_SIZE, "renderer resolution"),
        (FRAME_HEADERS_OFFSET, FRAME_HEADER_SIZE * BUFFER_COUNT, "frame headers"),
        (SCENE_BUFFERS_OFFSET, MAX_SCENE_SIZE * BUFFER_COUNT, "scene buffers"),
        (UI_BUFFERS_OFFSET, MAX_UI_SIZE * BUFFER_COUNT, "ui buffers"),
        (INPUT_QUEUE_OFFSET, INPUT_QUEUE_SIZE, "input queue"),
    ];
    for (offset, size, field) in rows {
        println!("  {:>10}  {:>10}  {}", offset, size, field);
    }
}
