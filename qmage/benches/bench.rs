//! Synthetic-packet benchmarks: no captured Qmage sample files exist for
//! this workspace, so each benchmark constructs a minimal, valid packet at
//! several sizes instead of loading fixtures from disk.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qmage::frame::{tight_linesize, PrevFrame};
use qmage::{header, Decoder, FrameView, Header};

const SIZES: [u16; 3] = [16, 64, 256];

fn still_header(width: u16, height: u16, encoder_mode: u8) -> Vec<u8> {
    vec![
        0x51, 0x4D, 0x0B, 0x00, 0x00, encoder_mode, width as u8, (width >> 8) as u8, height as u8,
        (height >> 8) as u8, 0x00, 0x00,
    ]
}

/// A W2_PASS depth=1 payload decoding to an all-zero raster: `cnt_table=0`,
/// one `idx=0` literal per 4-byte unit.
fn depth1_payload(width: u16, height: u16) -> Vec<u8> {
    let dim = usize::from(width) * usize::from(height) * 2;
    let units = dim / 4;

    let mut payload = Vec::with_capacity(16 + units + dim);
    payload.extend_from_slice(&0u32.to_le_bytes()); // cnt_table
    payload.extend_from_slice(&(units as u32).to_le_bytes()); // size_idx
    payload.extend_from_slice(&0u32.to_le_bytes()); // size_run
    payload.extend_from_slice(&0u32.to_le_bytes()); // reserved
    payload.extend(core::iter::repeat(0u8).take(units)); // gb1: idx=0 per unit
    payload.extend(core::iter::repeat(0u8).take(dim)); // gb3: zero literal per unit
    payload
}

fn depth1_packet(width: u16, height: u16) -> Vec<u8> {
    let mut data = still_header(width, height, 1);
    data.extend(depth1_payload(width, height));
    data
}

/// Wraps a depth=1 payload (already a multiple of 16 bytes long) in a
/// depth=2 envelope whose strip decisions all take the literal branch, so
/// the unscrambled intermediate buffer equals `target` byte for byte.
fn depth2_packet(width: u16, height: u16) -> Vec<u8> {
    let target = depth1_payload(width, height);
    assert_eq!(target.len() % 16, 0);

    let full_strips = target.len() / 16 - 1; // strip1 covers the first 16 bytes

    let mut bits = Vec::new();
    for _ in 0..6usize {
        bits.push(0);
        bits.push(1);
    }
    for _ in 0..full_strips {
        bits.push(0); // kind = raw strip
        bits.push(0); // raw = literal 16-byte read from gb3
    }
    while bits.len() % 8 != 0 {
        bits.push(0);
    }
    let mut gb1 = Vec::with_capacity(bits.len() / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for &b in chunk {
            byte = (byte << 1) | b;
        }
        gb1.push(byte);
    }

    let gb2 = vec![0u8; 3]; // dummy `rel` refresh bytes; never read back as rel is unused here

    let mut data = still_header(width, height, 1);
    data[5] |= 0b0001_0000; // flag5: depth = 2
    data.extend_from_slice(&(target.len() as u32).to_le_bytes()); // bsize
    data.extend_from_slice(&(gb1.len() as u32).to_le_bytes()); // len1
    data.extend_from_slice(&(gb2.len() as u32).to_le_bytes()); // len2
    data.extend(gb1);
    data.extend(gb2);
    data.extend(target);
    data
}

fn a9ll_intra_packet(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![
        0x51, 0x4D, 0x0B, 0x03, 0b1000_0000, 0x00, width as u8, (width >> 8) as u8, height as u8,
        (height >> 8) as u8, 0x00, 0x00,
    ];
    data.extend_from_slice(&0u32.to_le_bytes()); // alpha_position
    data.extend_from_slice(&1u16.to_le_bytes()); // total_frame_number
    data.extend_from_slice(&1u16.to_le_bytes()); // current_frame_number = keyframe
    data.extend_from_slice(&0u16.to_le_bytes());
    data.push(0);
    data.push(0);

    let cells = (usize::from(width) / 4) * (usize::from(height) / 4);
    let mut bits = Vec::with_capacity(cells * 2);
    for _ in 0..cells {
        bits.push(1);
        bits.push(1); // mode = 3: cheapest per-cell path
    }
    while bits.len() % 8 != 0 {
        bits.push(0);
    }
    let mut gb1 = Vec::with_capacity(bits.len() / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for &b in chunk {
            byte = (byte << 1) | b;
        }
        gb1.push(byte);
    }

    let gb1_start = data.len() as u32 + 8 + gb1.len() as u32;
    data.extend_from_slice(&gb1_start.to_le_bytes());
    data.extend_from_slice(&gb1_start.to_le_bytes()); // gb3_start == gb1_start: gb2/gb3 empty
    data.extend(gb1);
    data
}

fn a9ll_inter_packet_and_prev(width: u16, height: u16) -> (Header, Vec<u8>, Vec<u8>) {
    let header = Header {
        qversion: 0x0B,
        raw_type: 0,
        transparency: false,
        qp: 0,
        not_comp: false,
        use_chroma_key: false,
        mode: true,
        encoder_mode: 0,
        is_dynamic_table: false,
        alpha_depth: false,
        depth: 1,
        use_extra_exception: false,
        width,
        height,
        near_lossless: false,
        is_gray_type: false,
        use_index_color: false,
        pre_multiplied: false,
        not_alpha_comp: false,
        is_opaque: false,
        nine_patched: false,
        alpha_position: 0,
        alpha_encoder_mode: 0,
        total_frame_number: 2,
        current_frame_number: 2,
        animation_delay_time: 0,
        animation_no_repeat: 0,
        color_count: None,
        header_size: 24,
    };

    let mbs = (usize::from(width) / 16) * (usize::from(height) / 16);
    let mut bits = Vec::with_capacity(mbs * 2);
    for _ in 0..mbs {
        bits.push(1);
        bits.push(1); // h1=1, h2=1: verbatim copy, cheapest per-MB path
    }
    while bits.len() % 8 != 0 {
        bits.push(0);
    }
    let mut gb1 = Vec::with_capacity(bits.len() / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for &b in chunk {
            byte = (byte << 1) | b;
        }
        gb1.push(byte);
    }

    let mut data = vec![0u8; 24];
    let gb1_start = 24 + 8 + gb1.len() as u32;
    data.extend_from_slice(&gb1_start.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend(gb1);

    let linesize = tight_linesize(width);
    let prev = vec![0x55u8; linesize * usize::from(height)];

    (header, data, prev)
}

fn header_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("header parse");
    for &size in &SIZES {
        let data = depth1_packet(size, size);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("parse", size), &data, |b, data| {
            b.iter(|| header::parse(data).unwrap());
        });
    }
}

fn w2_pass_depth1(c: &mut Criterion) {
    let mut group = c.benchmark_group("w2_pass depth=1 decode");
    for &size in &SIZES {
        let data = depth1_packet(size, size);
        let pixel_count = u64::from(size) * u64::from(size);
        group.throughput(Throughput::Elements(pixel_count));
        group.bench_with_input(BenchmarkId::new("decode", size), &data, |b, data| {
            let linesize = tight_linesize(size);
            let mut buf = vec![0u8; linesize * usize::from(size)];
            b.iter(|| {
                let mut out = FrameView::new(&mut buf, size, size, linesize);
                Decoder::new().decode(data, &mut out).unwrap();
            });
        });
    }
}

fn w2_pass_depth2(c: &mut Criterion) {
    let mut group = c.benchmark_group("w2_pass depth=2 decode");
    for &size in &SIZES {
        let data = depth2_packet(size, size);
        let pixel_count = u64::from(size) * u64::from(size);
        group.throughput(Throughput::Elements(pixel_count));
        group.bench_with_input(BenchmarkId::new("decode", size), &data, |b, data| {
            let linesize = tight_linesize(size);
            let mut buf = vec![0u8; linesize * usize::from(size)];
            b.iter(|| {
                let mut out = FrameView::new(&mut buf, size, size, linesize);
                Decoder::new().decode(data, &mut out).unwrap();
            });
        });
    }
}

fn a9ll_intra(c: &mut Criterion) {
    let mut group = c.benchmark_group("a9ll intra decode");
    for &size in &SIZES {
        let data = a9ll_intra_packet(size, size);
        let pixel_count = u64::from(size) * u64::from(size);
        group.throughput(Throughput::Elements(pixel_count));
        group.bench_with_input(BenchmarkId::new("decode", size), &data, |b, data| {
            let linesize = tight_linesize(size);
            let mut buf = vec![0u8; linesize * usize::from(size)];
            b.iter(|| {
                let mut out = FrameView::new(&mut buf, size, size, linesize);
                Decoder::new().decode(data, &mut out).unwrap();
            });
        });
    }
}

fn a9ll_inter(c: &mut Criterion) {
    let mut group = c.benchmark_group("a9ll inter decode");
    for &size in &SIZES {
        let (header, data, prev_buf) = a9ll_inter_packet_and_prev(size, size);
        let pixel_count = u64::from(size) * u64::from(size);
        group.throughput(Throughput::Elements(pixel_count));
        group.bench_with_input(
            BenchmarkId::new("decode", size),
            &(header, data, prev_buf),
            |b, (header, data, prev_buf)| {
                let linesize = tight_linesize(size);
                let prev = PrevFrame::new(prev_buf, size, size, linesize);
                let mut buf = vec![0u8; linesize * usize::from(size)];
                b.iter(|| {
                    let mut out = FrameView::new(&mut buf, size, size, linesize);
                    qmage::a9ll::inter::decode(header, data, &mut out, &prev).unwrap();
                });
            },
        );
    }
}

criterion_group!(
    benches,
    header_parse,
    w2_pass_depth1,
    w2_pass_depth2,
    a9ll_intra,
    a9ll_inter
);
criterion_main!(benches);
