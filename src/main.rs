use clap::{Parser, Subcommand};
use freeimage_rs::{
    Bitmap, Config, Dib, ImageFormat, LoadMode, MetadataModel, MultiBitmap, OpenOptions, MODELS,
    init_from_config, library_info, plugin,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the FreeImage shared library
    #[arg(long, env = "FREEIMAGE_LIBRARY")]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about an image file
    Info {
        /// Image file to inspect
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Convert to the format implied by the output extension
    Convert {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Output image file (use appropriate extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Save flags passed to the format plugin
        #[arg(long, default_value = "0")]
        flags: i32,
    },

    /// Write a thumbnail of an image
    Thumbnail {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Output image file
        #[arg(short, long)]
        output: PathBuf,

        /// Longest side of the thumbnail in pixels
        #[arg(short, long, default_value = "128")]
        size: i32,
    },

    /// List metadata tags
    Tags {
        /// Image file to inspect
        #[arg(short, long)]
        input: PathBuf,

        /// Only this metadata model (numeric FIMD value)
        #[arg(short, long)]
        model: Option<i32>,
    },

    /// Count the pages of a multi-page file
    Pages {
        /// Multi-page image file (TIFF, GIF, ICO)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Decode with FreeImage and write through the image crate
    Export {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (.png, .jpg, ...)
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(path) = cli.library {
        config = config.with_library_path(path);
    }
    if config.mode == LoadMode::Lazy {
        tracing::debug!("lazy symbol binding requested");
    }
    init_from_config(&config);
    library_info::route_messages_to_tracing()?;

    match cli.command {
        Commands::Info { input } => info_command(input)?,
        Commands::Convert {
            input,
            output,
            flags,
        } => convert_command(input, output, flags)?,
        Commands::Thumbnail {
            input,
            output,
            size,
        } => thumbnail_command(input, output, size)?,
        Commands::Tags { input, model } => tags_command(input, model.map(MetadataModel::from))?,
        Commands::Pages { input } => pages_command(input)?,
        Commands::Export { input, output } => export_command(input, output)?,
    }

    Ok(())
}

fn load(input: &Path) -> Result<Bitmap, Box<dyn std::error::Error>> {
    let format = plugin::detect(input)?;
    if !format.is_known() {
        return Err(format!("Unrecognised image format: {}", input.display()).into());
    }
    Bitmap::load(format, input, 0)?
        .ok_or_else(|| format!("Could not decode {}", input.display()).into())
}

fn output_format(output: &Path) -> Result<ImageFormat, Box<dyn std::error::Error>> {
    let format = ImageFormat::from_filename(output)?;
    if !format.is_known() || !format.supports_writing()? {
        return Err(format!("Unsupported output format: {}", output.display()).into());
    }
    Ok(format)
}

/// Converts to a bit depth the target format can write, if needed.
fn exportable(bitmap: &Dib, format: ImageFormat) -> Result<Option<Bitmap>, Box<dyn std::error::Error>> {
    if format.supports_export_bpp(bitmap.bpp()? as i32)? {
        return Ok(None);
    }
    let converted = if format.supports_export_bpp(24)? {
        bitmap.convert_to_24_bits()?
    } else {
        bitmap.convert_to_8_bits()?
    };
    converted
        .map(Some)
        .ok_or_else(|| "Conversion for the output format failed".into())
}

fn save(bitmap: &Dib, output: &Path, flags: i32) -> Result<(), Box<dyn std::error::Error>> {
    let format = output_format(output)?;
    let converted = exportable(bitmap, format)?;
    let bitmap = converted.as_deref().unwrap_or(bitmap);
    if !bitmap.save(format, output, flags)? {
        return Err(format!("Could not save {}", output.display()).into());
    }
    Ok(())
}

fn info_command(input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let bitmap = load(&input)?;
    let format = plugin::detect(&input)?;

    println!("File: {}", input.display());
    println!(
        "Format: {} ({})",
        format.name()?.unwrap_or_default(),
        format.description()?.unwrap_or_default()
    );
    println!("Dimensions: {}x{}", bitmap.width()?, bitmap.height()?);
    println!("Bits per pixel: {}", bitmap.bpp()?);
    println!("Image type: {:?}", bitmap.image_type()?);
    println!("Color type: {:?}", bitmap.color_type()?);
    println!("Pixel data: {}", format_bytes(bitmap.dib_size()? as usize));

    if let Some(profile) = bitmap.icc_profile()? {
        if !profile.bytes().is_empty() {
            println!("ICC profile: {}", format_bytes(profile.bytes().len()));
        }
    }
    if bitmap.thumbnail()?.is_some() {
        println!("Has embedded thumbnail: Yes");
    }
    for model in MODELS {
        let count = bitmap.metadata_count(model)?;
        if count > 0 {
            println!("Metadata {:?}: {} tags", model, count);
        }
    }
    if let Some(version) = library_info::version()? {
        println!("FreeImage: {}", version);
    }

    Ok(())
}

fn convert_command(
    input: PathBuf,
    output: PathBuf,
    flags: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let bitmap = load(&input)?;
    save(&bitmap, &output, flags)?;
    println!("Converted {} to {}", input.display(), output.display());
    Ok(())
}

fn thumbnail_command(
    input: PathBuf,
    output: PathBuf,
    size: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let bitmap = load(&input)?;
    let thumbnail = bitmap
        .make_thumbnail(size, true)?
        .ok_or("Thumbnail generation failed")?;
    save(&thumbnail, &output, 0)?;
    println!(
        "Thumbnail {}x{} saved to {}",
        thumbnail.width()?,
        thumbnail.height()?,
        output.display()
    );
    Ok(())
}

fn tags_command(
    input: PathBuf,
    model: Option<MetadataModel>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bitmap = load(&input)?;
    let models: Vec<MetadataModel> = match model {
        Some(model) => vec![model],
        None => MODELS.to_vec(),
    };

    for model in models {
        for tag in bitmap.metadata_iter(model)? {
            println!(
                "{:?}\t{}\t{}",
                model,
                tag.key()?.unwrap_or_default(),
                tag.display(model, None)?.unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn pages_command(input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let format = plugin::detect(&input)?;
    let container = MultiBitmap::open(format, &input, OpenOptions::read_only())?
        .ok_or_else(|| format!("Could not open {} as a multi-page file", input.display()))?;
    let count = container.page_count()?;
    println!("{}: {} page(s)", input.display(), count);

    for index in 0..count {
        if let Some(page) = container.lock_page(index)? {
            println!(
                "  page {}: {}x{} at {} bpp",
                page.index(),
                page.width()?,
                page.height()?,
                page.bpp()?
            );
        }
    }
    container.close(0);
    Ok(())
}

fn export_command(input: PathBuf, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let bitmap = load(&input)?;
    let image = bitmap
        .to_rgba_image()?
        .ok_or("Conversion to RGBA failed")?;

    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => {
            image::DynamicImage::ImageRgba8(image)
                .to_rgb8()
                .save_with_format(&output, image::ImageFormat::Jpeg)?;
        }
        "png" => {
            image.save_with_format(&output, image::ImageFormat::Png)?;
        }
        _ => {
            return Err(format!("Unsupported output format: {}", ext).into());
        }
    }

    println!("Image saved to: {}", output.display());
    Ok(())
}

// Helper function to format byte sizes in a human-readable way
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
