//! Integration test: note row hex → linked notes → expansion → MIDI lines

use delrpp_core::{link_conditions, Condition, Note};
use delrpp_services::{ClipRenderer, InstrumentClip, NoteRow, RenderConfig};

fn clip_from_hex(length: u64, rows: &[(i32, &str)]) -> InstrumentClip {
    let mut clip = InstrumentClip::new(0, length);
    for &(row, data) in rows {
        clip.add_row(NoteRow::from_note_data(row, false, data).unwrap());
    }
    clip
}

#[test]
fn periodic_clip_is_unrolled_over_instance() {
    // Row 60: always at 0. Row 62: "1 of 2" (0x15) at 48.
    let clip = clip_from_hex(
        96,
        &[(60, "0x00000000000000186414"), (62, "0x00000030000000185015")],
    );

    let rendered = ClipRenderer::new(RenderConfig::seeded(5)).render_clip(&clip, 384);

    assert!(rendered.expanded);
    assert_eq!(rendered.content_length, 384);
    assert_eq!(
        rendered.lines(),
        vec![
            "E 0 90 3c 64",
            "E 24 80 3c 0",
            "E 24 90 3e 50",
            "E 24 80 3e 0",
            "E 24 90 3c 64",
            "E 24 80 3c 0",
            "E 72 90 3c 64",
            "E 24 80 3c 0",
            "E 24 90 3e 50",
            "E 24 80 3e 0",
            "E 24 90 3c 64",
            "E 24 80 3c 0",
            "E 72 b0 7b 0",
        ]
    );
}

#[test]
fn offsets_always_span_content_length() {
    let data = "0x00000000000000306407000000300000003064870000005A0000003064F0";
    let clip = clip_from_hex(96, &[(60, data), (64, "0x00000000000000186407")]);
    let mut renderer = ClipRenderer::new(RenderConfig::seeded(11));

    for instance_length in [96, 200, 385, 1000] {
        let rendered = renderer.render_clip(&clip, instance_length);
        let total: u64 = rendered.messages.iter().map(|m| m.offset).sum();
        assert_eq!(total, rendered.content_length, "instance {instance_length}");
    }
}

#[test]
fn same_seed_renders_identically() {
    let data = "0x00000000000000186408000000300000001864080000006000000018640C";
    let clip = clip_from_hex(96, &[(60, data)]);

    let a = ClipRenderer::new(RenderConfig::seeded(77)).render_clip(&clip, 96 * 16);
    let b = ClipRenderer::new(RenderConfig::seeded(77)).render_clip(&clip, 96 * 16);
    assert_eq!(a.lines(), b.lines());
}

#[test]
fn exclusive_stack_plays_one_note_per_loop() {
    // 30% + 30% + 40% on the same pulse
    let clip = clip_from_hex(
        96,
        &[
            (60, "0x00000000000000186406"),
            (62, "0x00000000000000186406"),
            (64, "0x00000000000000186408"),
        ],
    );
    let loops = 250u64;
    let rendered = ClipRenderer::new(RenderConfig::seeded(3)).render_clip(&clip, 96 * loops);

    let note_ons = rendered.messages.iter().filter(|m| m.is_note_on()).count() as u64;
    assert_eq!(note_ons, loops);
}

#[test]
fn dotted_complement_alternates_with_base() {
    // 70% at 0, dotted 30% at 48
    let mut notes = vec![
        Note::new(60, 0, 12, 100)
            .with_condition(Condition::Probability { probability: 0.7, dotted: false }),
        Note::new(62, 48, 12, 100)
            .with_condition(Condition::Probability { probability: 0.3, dotted: true }),
    ];
    link_conditions(&mut notes);

    let loops = 200u64;
    let rendered =
        ClipRenderer::new(RenderConfig::seeded(8)).render_notes(0, &notes, 96, 96 * loops);
    let note_ons: Vec<u8> = rendered
        .messages
        .iter()
        .filter(|m| m.is_note_on())
        .map(|m| m.data1)
        .collect();

    // Exactly one of the pair plays each loop
    assert_eq!(note_ons.len() as u64, loops);
}
