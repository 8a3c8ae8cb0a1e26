use argh::FromArgs;
use image::{ImageFormat, RgbImage};
use qmage::frame::{tight_linesize, FrameView};
use qmage::{alpha, header, Decoder};
use std::path::Path;
use std::str::FromStr;

/// Qmage cli decoder.
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Decode(Decode),
    DecodeRaw(DecodeRaw),
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Png,
    Jpg,
    Bmp,
}

impl FromStr for Format {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(format) = s.eq_ignore_ascii_case("png").then_some(Format::Png)
               .or_else(|| s.eq_ignore_ascii_case("jpg").then_some(Format::Jpg))
               .or_else(|| s.eq_ignore_ascii_case("bmp").then_some(Format::Bmp))
        else { return Err("invalid string"); };

        Ok(format)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let Cli { command } = argh::from_env();

    match command {
        Command::Decode(options) => decode(options),
        Command::DecodeRaw(options) => decode_raw(options),
    }
}

/// Length, in bytes, of the single packet starting at `data[0]`. Stills
/// (`!header.mode`) occupy the whole remaining buffer; animation frames are
/// sized via the alpha sub-bitstream scan (`spec.md` §6).
fn next_packet_len(data: &[u8]) -> Result<usize, Box<dyn std::error::Error>> {
    let header = header::parse(data).map_err(|e| format!("{e}"))?;
    let len = match alpha::packet_boundary(data, &header).map_err(|e| format!("{e}"))? {
        alpha::PacketBoundary::WholeStream => data.len(),
        alpha::PacketBoundary::Sized(n) => n as usize,
    };
    if len == 0 {
        return Err("qmage: zero-length packet".into());
    }
    Ok(len)
}

/// Derives the output path for one decoded frame. Single-frame inputs keep
/// writing to exactly `output`; multi-frame animations get the frame index
/// inserted before the extension (`foo.png` -> `foo-0001.png`).
fn frame_output_path(output: &str, index: usize, multi_frame: bool) -> String {
    if !multi_frame {
        return output.to_string();
    }

    let path = Path::new(output);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}-{index:04}.{ext}"),
        None => format!("{stem}-{index:04}"),
    };

    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name).to_string_lossy().into_owned(),
        _ => name,
    }
}

/// Decodes a single Qmage packet into an image file.
#[derive(FromArgs)]
#[argh(subcommand, name = "decode")]
struct Decode {
    /// output format (png, jpg, bmp)
    #[argh(option)]
    format: Format,

    /// the Qmage input file
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

fn decode(options: Decode) -> Result<(), Box<dyn std::error::Error>> {
    let Decode {
        format,
        input,
        output,
    } = options;

    let data = std::fs::read(&input)?;
    println!("Decoding `{input}`");

    let first_header = header::parse(&data).map_err(|e| format!("{e}"))?;
    let multi_frame = first_header.mode && first_header.total_frame_number > 1;

    let mut decoder = Decoder::new();
    let mut offset = 0usize;
    let mut frame_index = 0usize;

    while offset < data.len() {
        let packet_len = next_packet_len(&data[offset..])?;
        let packet = &data[offset..offset + packet_len];

        let header = header::parse(packet).map_err(|e| format!("{e}"))?;
        let linesize = tight_linesize(header.width);
        let mut buf = vec![0u8; linesize * usize::from(header.height)];
        let mut out = FrameView::new(&mut buf, header.width, header.height, linesize);

        let info = decoder
            .decode(packet, &mut out)
            .map_err(|e| format!("{e}"))?;

        let mut rgb888 =
            Vec::with_capacity(usize::from(info.width) * usize::from(info.height) * 3);
        for px in buf.chunks_exact(2) {
            let pixel = u16::from_le_bytes([px[0], px[1]]);
            let r = ((pixel >> 11) & 0x1F) as u8;
            let g = ((pixel >> 5) & 0x3F) as u8;
            let b = (pixel & 0x1F) as u8;
            rgb888.push((r << 3) | (r >> 2));
            rgb888.push((g << 2) | (g >> 4));
            rgb888.push((b << 3) | (b >> 2));
        }

        let frame_output = frame_output_path(&output, frame_index, multi_frame);
        RgbImage::from_vec(u32::from(info.width), u32::from(info.height), rgb888)
            .ok_or("failed to create image")?
            .save_with_format(
                &frame_output,
                match format {
                    Format::Png => ImageFormat::Png,
                    Format::Jpg => ImageFormat::Jpeg,
                    Format::Bmp => ImageFormat::Bmp,
                },
            )?;

        println!(
            "Written {}x{} image to `{frame_output}`",
            info.width, info.height
        );

        offset += packet_len;
        frame_index += 1;
    }

    Ok(())
}

/// Decodes a single Qmage packet into a raw RGB565LE file.
#[derive(FromArgs)]
#[argh(subcommand, name = "decode-raw")]
struct DecodeRaw {
    /// the Qmage input file
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

fn decode_raw(options: DecodeRaw) -> Result<(), Box<dyn std::error::Error>> {
    let DecodeRaw { input, output } = options;

    let data = std::fs::read(&input)?;
    println!("Decoding `{input}`");

    let first_header = header::parse(&data).map_err(|e| format!("{e}"))?;
    let multi_frame = first_header.mode && first_header.total_frame_number > 1;

    let mut decoder = Decoder::new();
    let mut offset = 0usize;
    let mut frame_index = 0usize;

    while offset < data.len() {
        let packet_len = next_packet_len(&data[offset..])?;
        let packet = &data[offset..offset + packet_len];

        let header = header::parse(packet).map_err(|e| format!("{e}"))?;
        let linesize = tight_linesize(header.width);
        let mut buf = vec![0u8; linesize * usize::from(header.height)];
        let mut out = FrameView::new(&mut buf, header.width, header.height, linesize);

        let info = decoder
            .decode(packet, &mut out)
            .map_err(|e| format!("{e}"))?;

        let frame_output = frame_output_path(&output, frame_index, multi_frame);
        std::fs::write(&frame_output, &buf)?;
        println!(
            "Written {}x{} image to `{frame_output}`",
            info.width, info.height
        );

        offset += packet_len;
        frame_index += 1;
    }

    Ok(())
}
