//! Damage-scan benchmarks: full repaints, sparse updates, and the
//! all-clean fast path.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use scanline_core::geometry::{Position, Size};
use scanline_core::style::{AnsiColor, Color, Style};
use scanline_render::buffer::Buffer;
use scanline_render::cell::Cell;
use scanline_render::damage::damage;

fn scene(size: Size, seed: u64) -> Buffer {
    let mut buf = Buffer::new(size);
    let mut rng = seed;
    let count = size.area() / 8;
    for _ in 0..count {
        rng = rng.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let row = ((rng >> 33) as u16) % size.height + 1;
        let column = ((rng >> 17) as u16) % size.width + 1;
        let ch = char::from(b'a' + (rng % 26) as u8);
        let style = if rng & 1 == 0 {
            Style::new()
        } else {
            Style::new().with_foreground(Some(Color::ansi(AnsiColor::Green)))
        };
        buf.set(Position::new(row, column), Cell::new(ch, style));
    }
    buf
}

fn bench_damage(c: &mut Criterion) {
    let size = Size::new(120, 40);

    let blank = Buffer::new(size);
    let full = scene(size, 0x5eed_0001);
    c.bench_function("damage/full_repaint_120x40", |b| {
        b.iter(|| black_box(damage(black_box(&blank), black_box(&full))))
    });

    let base = scene(size, 0x5eed_0002);
    let mut sparse = scene(size, 0x5eed_0002);
    sparse.set(Position::new(5, 10), Cell::new('!', Style::new()));
    sparse.set(Position::new(30, 100), Cell::new('?', Style::new()));
    c.bench_function("damage/sparse_update_120x40", |b| {
        b.iter(|| black_box(damage(black_box(&base), black_box(&sparse))))
    });

    c.bench_function("damage/unchanged_120x40", |b| {
        b.iter(|| black_box(damage(black_box(&base), black_box(&base))))
    });
}

criterion_group!(benches, bench_damage);
criterion_main!(benches);
