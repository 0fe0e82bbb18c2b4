use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dimchunk::{ChunkPlan, DeviceKind, NdSbp, Placement, Shape};

pub fn start_logger(level: log::LevelFilter) {
    let logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();
    match logger {
        Ok(_) => log::info!("Logging initialized."),
        Err(error) => eprintln!("Error initializing logging: {:?}", error),
    }
}

fn print_plan(shape: &Shape, plan: &ChunkPlan, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }
    println!(
        "{:?} along dim {}: {} chunks of {}",
        shape,
        plan.dim(),
        plan.len(),
        plan.chunk_size()
    );
    for ((idx, spec), out) in plan.iter().enumerate().zip(plan.output_shapes(shape)) {
        println!("  {:>3}  {:<24} {:?}", idx, spec.to_string(), out);
    }
    Ok(())
}

fn shape_and_dim(matches: &ArgMatches) -> anyhow::Result<(Shape, usize)> {
    let shape = matches
        .get_one::<Shape>("shape")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("--shape is required"))?;
    let dim = *matches.get_one::<isize>("dim").unwrap_or(&0);
    let dim = shape.resolve_dim(dim)?;
    Ok((shape, dim))
}

fn handle_plan(matches: &ArgMatches) -> anyhow::Result<()> {
    let (shape, dim) = shape_and_dim(matches)?;
    let chunks = *matches.get_one::<usize>("chunks").unwrap_or(&1);
    let plan = ChunkPlan::chunk(&shape, dim, chunks)?;
    print_plan(&shape, &plan, matches.get_flag("json"))
}

fn handle_split(matches: &ArgMatches) -> anyhow::Result<()> {
    let (shape, dim) = shape_and_dim(matches)?;
    let size = *matches.get_one::<usize>("size").unwrap_or(&1);
    let plan = ChunkPlan::split(&shape, dim, size)?;
    print_plan(&shape, &plan, matches.get_flag("json"))
}

fn handle_shard(matches: &ArgMatches) -> anyhow::Result<()> {
    let shape = matches
        .get_one::<Shape>("shape")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("--shape is required"))?;
    let nd_sbp = matches
        .get_one::<NdSbp>("sbp")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("--sbp is required"))?;
    let device = *matches.get_one::<DeviceKind>("device").unwrap_or(&DeviceKind::Cpu);
    let hierarchy = matches
        .get_one::<Shape>("hierarchy")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("--hierarchy is required"))?;
    let ranks = (0..hierarchy.numel()).collect::<Vec<_>>();
    let placement = Placement::new(device, ranks, hierarchy)?;
    log::info!("Sharding {:?} under {} on {}", shape, nd_sbp, placement);

    let shards = placement
        .ranks()
        .iter()
        .map(|&rank| {
            let spec = placement.local_spec(&shape, &nd_sbp, rank)?;
            let local = spec.output_shape(&shape)?;
            Ok((rank, spec, local))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if matches.get_flag("json") {
        let value = shards
            .iter()
            .map(|(rank, spec, local)| {
                serde_json::json!({ "rank": rank, "spec": spec, "local_shape": local })
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    for (rank, spec, local) in shards {
        println!("  rank {:>3}  {:<24} {:?}", rank, spec.to_string(), local);
    }
    Ok(())
}

fn shape_arg() -> Arg {
    Arg::new("shape")
        .short('s')
        .long("shape")
        .required(true)
        .help("Tensor shape, e.g. 5,3,6,9")
        .value_parser(value_parser!(Shape))
}

fn dim_arg() -> Arg {
    Arg::new("dim")
        .short('d')
        .long("dim")
        .default_value("0")
        .allow_negative_numbers(true)
        .help("Dimension to split; negative values count from the end.")
        .value_parser(value_parser!(isize))
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the result as JSON.")
}

fn main() -> anyhow::Result<()> {
    let matches = Command::new("dimchunk")
        .about("Plan how tensor dimensions are chunked and sharded")
        .version("0.1.0")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log verbosity: off, error, warn, info, debug or trace.")
                .value_parser(value_parser!(log::LevelFilter)),
        )
        .subcommand(
            Command::new("plan")
                .about("Split a dimension into a number of chunks.")
                .arg(shape_arg())
                .arg(dim_arg())
                .arg(
                    Arg::new("chunks")
                        .short('c')
                        .long("chunks")
                        .required(true)
                        .help("Number of chunks to request.")
                        .value_parser(value_parser!(usize)),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("split")
                .about("Split a dimension into chunks of a fixed size.")
                .arg(shape_arg())
                .arg(dim_arg())
                .arg(
                    Arg::new("size")
                        .short('n')
                        .long("size")
                        .required(true)
                        .help("Elements per chunk.")
                        .value_parser(value_parser!(usize)),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("shard")
                .about("Show which region of a tensor each rank owns under an SBP signature.")
                .arg(shape_arg())
                .arg(
                    Arg::new("sbp")
                        .short('p')
                        .long("sbp")
                        .required(true)
                        .help("One SBP per hierarchy axis, e.g. S(0),B")
                        .value_parser(value_parser!(NdSbp)),
                )
                .arg(
                    Arg::new("hierarchy")
                        .long("hierarchy")
                        .required(true)
                        .help("Device hierarchy, e.g. 2,2")
                        .value_parser(value_parser!(Shape)),
                )
                .arg(
                    Arg::new("device")
                        .long("device")
                        .default_value("cpu")
                        .value_parser(value_parser!(DeviceKind)),
                )
                .arg(json_arg()),
        )
        .get_matches();

    let level = *matches
        .get_one::<log::LevelFilter>("log-level")
        .unwrap_or(&log::LevelFilter::Warn);
    start_logger(level);

    match matches.subcommand() {
        Some(("plan", sub)) => handle_plan(sub),
        Some(("split", sub)) => handle_split(sub),
        Some(("shard", sub)) => handle_shard(sub),
        _ => unreachable!(),
    }
}
