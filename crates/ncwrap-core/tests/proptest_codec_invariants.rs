//! Property tests for the channel and cell codecs through the public API.

use ncwrap_core::{Alpha, Cell, Channel, Channels, Color, EgcPool, Style};
use proptest::prelude::*;

fn arb_color() -> impl Strategy<Value = Color> {
    any::<u32>().prop_map(Color::from_u32)
}

fn arb_fg_alpha() -> impl Strategy<Value = Alpha> {
    prop::sample::select(Alpha::ALL.to_vec())
}

fn arb_bg_alpha() -> impl Strategy<Value = Alpha> {
    prop::sample::select(vec![Alpha::Opaque, Alpha::Blend, Alpha::Transparent])
}

#[test]
fn red_blend_over_black_opaque() {
    let ch = Channels::pack(Color::RED, Alpha::Blend, Color::BLACK, Alpha::Opaque);
    assert_eq!(ch.fg_channel().raw(), 0x50FF_0000);
    assert_eq!(ch.bg_channel().raw(), 0x4000_0000);
    assert_eq!(ch.raw(), 0x50FF_0000_4000_0000);
}

#[test]
fn cell_keeps_packed_channels() {
    let ch = Channels::pack(Color::RED, Alpha::Blend, Color::BLACK, Alpha::Opaque);
    let cell = Cell::pack('x', 1, Style::BOLD.bits(), ch).unwrap();
    assert_eq!(cell.fg_rgb(), Color::RED);
    assert_eq!(cell.fg_alpha(), Alpha::Blend);
    assert_eq!(cell.bg_rgb(), Color::BLACK);
    assert_eq!(cell.bg_alpha(), Alpha::Opaque);
}

proptest! {
    #[test]
    fn channels_round_trip(fg in arb_color(), fa in arb_fg_alpha(), bg in arb_color(), ba in arb_bg_alpha()) {
        let ch = Channels::pack(fg, fa, bg, ba);
        prop_assert_eq!(ch.fg_rgb(), fg);
        prop_assert_eq!(ch.fg_alpha(), fa);
        prop_assert_eq!(ch.bg_rgb(), bg);
        prop_assert_eq!(ch.bg_alpha(), ba);
        prop_assert_eq!(Channels::combine(ch.fg_channel(), ch.bg_channel()), ch);
    }

    #[test]
    fn single_channel_color_and_alpha_are_disjoint(color in arb_color(), alpha in arb_fg_alpha()) {
        let mut c = Channel::from_color(color);
        c.set_alpha(alpha);
        prop_assert_eq!(c.rgb(), color);
        prop_assert_eq!(c.alpha(), alpha);
        c.set_rgb(Color::WHITE);
        prop_assert_eq!(c.alpha(), alpha);
    }

    #[test]
    fn cell_bg_alpha_mutation_is_isolated(c in "[a-z]", fg in arb_color(), bg in arb_color(), ba in arb_bg_alpha()) {
        let mut pool = EgcPool::new();
        let mut cell = Cell::load(&mut pool, &c, Style::UNDERLINE, Channels::from_colors(fg, bg)).unwrap();
        let before = cell;
        cell.set_bg_alpha(ba).unwrap();
        prop_assert_eq!(cell.gcluster(), before.gcluster());
        prop_assert_eq!(cell.width(), before.width());
        prop_assert_eq!(cell.stylemask(), before.stylemask());
        prop_assert_eq!(cell.fg_rgb(), fg);
        prop_assert_eq!(cell.fg_alpha(), before.fg_alpha());
        prop_assert_eq!(cell.bg_rgb(), bg);
        prop_assert_eq!(cell.bg_alpha(), ba);
    }
}
