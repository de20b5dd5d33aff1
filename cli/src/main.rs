use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};
use dataset::{AssemblyConfig, Assembler, ReshufflePolicy};
use log::{error, info, warn};
use renderer::{vector_to_raster, RenderParams};
use structures::{LabelTable, ModelManifest, RasterEncoding};
use strokes::{ndjson, DrawingReader, DrawingWriter, Pull};
use wire::{decode_payload, GRID_SIDE};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    /// 28x28 antialiased, for training
    #[value(name = "quickdraw28")]
    Quickdraw28,
    /// 64x64 binary, matching the drawing client
    #[value(name = "wire64")]
    Wire64,
}

impl From<EncodingArg> for RasterEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Quickdraw28 => RasterEncoding::QUICKDRAW_28,
            EncodingArg::Wire64 => RasterEncoding::WIRE_64,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReshuffleArg {
    Stable,
    PerEpoch,
}

impl From<ReshuffleArg> for ReshufflePolicy {
    fn from(arg: ReshuffleArg) -> Self {
        match arg {
            ReshuffleArg::Stable => ReshufflePolicy::Stable,
            ReshuffleArg::PerEpoch => ReshufflePolicy::PerEpoch,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert simplified ndjson drawings into a binary drawing file
    Pack { in_file: PathBuf, out_file: PathBuf },
    /// Print a summary of each drawing in a binary drawing file
    Inspect {
        file: PathBuf,
        #[clap(short, long)]
        /// stop after this many drawings
        limit: Option<u64>,
    },
    /// Render one drawing to a grayscale PNG
    Render {
        file: PathBuf,
        out_file: PathBuf,
        #[clap(short, long, default_value = "0")]
        index: u64,
        #[clap(long, default_value = "28")]
        side: u32,
        #[clap(long, default_value = "16")]
        line_diameter: f32,
        #[clap(long, default_value = "16")]
        padding: f32,
        #[clap(long)]
        /// binarize at this coverage
        threshold: Option<u8>,
    },
    /// Build the label table for a data directory and save it as a manifest
    Labels {
        data_dir: PathBuf,
        manifest: PathBuf,
        #[clap(long)]
        /// fail unless the directory has exactly this many categories
        class_count: Option<usize>,
        #[clap(long, value_enum, default_value = "quickdraw28")]
        encoding: EncodingArg,
    },
    /// Run the dataset pipeline and report what it produced
    Assemble {
        data_dir: PathBuf,
        #[clap(long, value_enum, default_value = "quickdraw28")]
        encoding: EncodingArg,
        #[clap(long, default_value = "10000")]
        cap: usize,
        #[clap(long, default_value = "0.2")]
        validation_fraction: f64,
        #[clap(long)]
        epoch_size: Option<usize>,
        #[clap(long, default_value = "10000")]
        shuffle_buffer: usize,
        #[clap(long, default_value = "42")]
        seed: u64,
        #[clap(long, value_enum, default_value = "stable")]
        reshuffle: ReshuffleArg,
        #[clap(long, default_value = "64")]
        batch_size: usize,
        #[clap(long)]
        keep_remainder: bool,
        #[clap(long, default_value = "1")]
        epochs: u64,
        #[clap(long)]
        /// write the first validation batch as PNGs, plus the manifest and config
        dump_dir: Option<PathBuf>,
        #[clap(long)]
        /// fail unless the model expects exactly this many categories
        class_count: Option<usize>,
        #[clap(long)]
        /// keep the class indices and encoding of an earlier run's manifest
        manifest: Option<PathBuf>,
    },
    /// Decode a client payload and print the grid
    Decode {
        /// base64 payload, or - to read it from stdin
        payload: String,
        #[clap(long)]
        /// check the payload against this model manifest
        manifest: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Pack { in_file, out_file } => pack(&in_file, &out_file),
        Commands::Inspect { file, limit } => inspect(&file, limit),
        Commands::Render {
            file,
            out_file,
            index,
            side,
            line_diameter,
            padding,
            threshold,
        } => render(
            &file,
            &out_file,
            index,
            RenderParams::new(side, line_diameter, padding),
            threshold,
        ),
        Commands::Labels {
            data_dir,
            manifest,
            class_count,
            encoding,
        } => labels(&data_dir, &manifest, class_count, encoding.into()),
        Commands::Assemble {
            data_dir,
            encoding,
            cap,
            validation_fraction,
            epoch_size,
            shuffle_buffer,
            seed,
            reshuffle,
            batch_size,
            keep_remainder,
            epochs,
            dump_dir,
            class_count,
            manifest,
        } => {
            let mut config = AssemblyConfig::default()
                .with_encoding(encoding.into())
                .with_cap(cap)
                .with_validation_fraction(validation_fraction)
                .with_shuffle_buffer(shuffle_buffer)
                .with_seed(seed)
                .with_reshuffle(reshuffle.into())
                .with_batch_size(batch_size)
                .with_drop_remainder(!keep_remainder);
            config.epoch_size = epoch_size;
            config.class_count = class_count;

            assemble(
                &data_dir,
                config,
                manifest.as_deref(),
                epochs,
                dump_dir.as_deref(),
            )
        }
        Commands::Decode { payload, manifest } => decode(&payload, manifest.as_deref()),
    }
}

fn pack(in_file: &Path, out_file: &Path) -> anyhow::Result<()> {
    let input = File::open(in_file).with_context(|| format!("opening {}", in_file.display()))?;
    let output =
        File::create(out_file).with_context(|| format!("creating {}", out_file.display()))?;

    let mut writer = DrawingWriter::new(BufWriter::new(output));
    let summary = ndjson::import(BufReader::new(input), &mut writer)?;
    writer.finish()?;

    info!(
        "wrote {} drawings to {} ({} lines skipped)",
        summary.written,
        out_file.display(),
        summary.skipped
    );
    Ok(())
}

fn inspect(file: &Path, limit: Option<u64>) -> anyhow::Result<()> {
    let mut reader = DrawingReader::open(file)?;

    loop {
        if limit.map_or(false, |limit| reader.records_read() >= limit) {
            println!("stopped after {} records", reader.records_read());
            return Ok(());
        }

        match reader.pull() {
            Pull::Drawing(drawing) => {
                let drawn_at = DateTime::from_timestamp(i64::from(drawing.timestamp), 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| drawing.timestamp.to_string());

                println!(
                    "{:>20}  {}  {}  {}  {:>3} strokes  {:>4} points",
                    drawing.id,
                    drawing.country_code(),
                    if drawing.recognized { "recognized  " } else { "unrecognized" },
                    drawn_at,
                    drawing.strokes.len(),
                    drawing.num_points()
                );
            }
            Pull::End => {
                println!("end of file after {} records", reader.records_read());
                return Ok(());
            }
            Pull::Failed(err) => {
                println!("corrupt after {} records: {}", reader.records_read(), err);
                return Ok(());
            }
        }
    }
}

fn render(
    file: &Path,
    out_file: &Path,
    index: u64,
    params: RenderParams,
    threshold: Option<u8>,
) -> anyhow::Result<()> {
    let mut reader = DrawingReader::open(file)?;

    let drawing = loop {
        match reader.pull() {
            Pull::Drawing(drawing) if reader.records_read() > index => break drawing,
            Pull::Drawing(_) => continue,
            Pull::End => bail!(
                "{} has only {} drawings",
                file.display(),
                reader.records_read()
            ),
            Pull::Failed(err) => return Err(err.into()),
        }
    };

    let mut image = vector_to_raster(&drawing.strokes, &params)
        .with_context(|| format!("rendering drawing {}", drawing.id))?;
    if let Some(threshold) = threshold {
        image = image.binarize(threshold);
    }

    image
        .to_gray_image()
        .save(out_file)
        .with_context(|| format!("saving {}", out_file.display()))?;

    info!(
        "rendered drawing {} at {}x{} to {}",
        drawing.id,
        params.side,
        params.side,
        out_file.display()
    );
    Ok(())
}

fn labels(
    data_dir: &Path,
    manifest_path: &Path,
    class_count: Option<usize>,
    encoding: RasterEncoding,
) -> anyhow::Result<()> {
    let names: Vec<String> = dataset::discover_categories(data_dir)?
        .into_iter()
        .map(|source| source.name)
        .collect();

    let labels = match class_count {
        Some(count) => LabelTable::with_class_count(names, count)?,
        None => LabelTable::new(names)?,
    };
    if labels.is_empty() {
        bail!("no drawing files in {}", data_dir.display());
    }

    for (index, name) in labels.iter() {
        println!("{index:>5}  {name}");
    }

    ModelManifest::new(encoding, labels).save(manifest_path)?;
    info!("saved manifest to {}", manifest_path.display());
    Ok(())
}

fn assemble(
    data_dir: &Path,
    config: AssemblyConfig,
    manifest: Option<&Path>,
    epochs: u64,
    dump_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let assembler = match manifest {
        Some(path) => {
            let manifest = ModelManifest::load(path)
                .with_context(|| format!("loading manifest {}", path.display()))?;
            if manifest.encoding != config.encoding {
                info!("using the manifest's encoding {:?}", manifest.encoding);
            }
            let config = config.with_encoding(manifest.encoding);
            Assembler::from_directory_with_labels(data_dir, manifest.labels, config)?
        }
        None => Assembler::from_directory(data_dir, config)?,
    };
    info!(
        "{} categories, {} validation examples",
        assembler.labels().len(),
        assembler.validation_len()
    );

    if let Some(dir) = dump_dir {
        dump_first_batch(&assembler, dir)?;
    }

    let validation_batches = assembler.batches(assembler.validation()).count();
    info!("validation: {} batches", validation_batches);

    for epoch in 0..epochs {
        let mut train = assembler.train_epoch(epoch);
        let batches = assembler.batches(train.by_ref()).count();
        info!("epoch {}: {} training batches", epoch, batches);

        if epoch + 1 == epochs {
            let report = train.get_ref().report();
            for name in report.failed_categories() {
                warn!("category {} did not read cleanly", name);
            }
            info!("\n{}", report);
        }
    }

    Ok(())
}

fn dump_first_batch(assembler: &Assembler, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    assembler.manifest().save(dir.join("manifest.msgpack"))?;
    let config = File::create(dir.join("config.json"))?;
    serde_json::to_writer_pretty(BufWriter::new(config), assembler.config())?;

    let Some(batch) = assembler.batches(assembler.validation()).next() else {
        warn!("no full validation batch to dump");
        return Ok(());
    };

    for (i, (image, &label)) in batch.images.iter().zip(&batch.labels).enumerate() {
        let name = assembler.labels().describe(i64::from(label)).replace(' ', "_");
        let path = dir.join(format!("{i:04}_{name}.png"));
        image
            .to_gray_image()
            .save(&path)
            .with_context(|| format!("saving {}", path.display()))?;
    }

    info!("dumped {} examples to {}", batch.len(), dir.display());
    Ok(())
}

fn decode(payload: &str, manifest: Option<&Path>) -> anyhow::Result<()> {
    let payload = if payload == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        payload.to_string()
    };

    let grid = decode_payload(&payload)?;

    if let Some(path) = manifest {
        let manifest = ModelManifest::load(path)
            .with_context(|| format!("loading {}", path.display()))?;
        if !manifest.encoding.is_wire_compatible() {
            return Err(anyhow!(
                "model in {} was trained on {:?}, which the client cannot send",
                path.display(),
                manifest.encoding
            ));
        }
        info!("payload matches a {}-class model", manifest.labels.len());
    }

    for y in 0..GRID_SIDE {
        let row: String = (0..GRID_SIDE)
            .map(|x| if grid.get(x, y) { '#' } else { '.' })
            .collect();
        println!("{row}");
    }
    info!("{} cells inked", grid.ink_cells());

    Ok(())
}
