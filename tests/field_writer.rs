mod common;

use common::{Recorder, defs_path};
use regmap::loader::fielddefs::{emit, parse_field_file};
use regmap::{FieldWriter, RegError, WordWindow};

fn lmk() -> FieldWriter<Recorder> {
    let src = std::fs::read_to_string(defs_path("lmk.fields")).expect("lmk.fields readable");
    FieldWriter::from_source(Recorder::new(0x200), &src).expect("definitions load")
}

#[test]
fn configuration_is_written_in_register_order() {
    let mut lmk = lmk();
    lmk.write("PLL_N", 0x2A5).expect("PLL_N fits in 10 bits");
    lmk.write("OUT1_DIV", 0x10).expect("OUT1_DIV");
    assert!(lmk.backend().writes.is_empty(), "cached until flushed");

    lmk.enable_write(true);
    lmk.flush(0, 0x153).expect("flush");
    assert_eq!(
        lmk.backend().writes,
        vec![
            (0x000, 0x00),
            (0x016, 0x02),
            (0x017, 0xA5),
            (0x018, 0x02),
            (0x100, 0x08),
            (0x101, 0x10),
            (0x140, 0x11),
            (0x141, 0x00),
        ]
    );
    assert!(lmk.backend().reads.is_empty());
}

#[test]
fn live_writes_skip_the_cache() {
    let mut lmk = lmk();
    lmk.enable_write(true);
    lmk.flush_all().expect("initial configuration");
    lmk.backend_mut().writes.clear();

    lmk.write("PLL_PD", 1).expect("power down");
    assert_eq!(lmk.backend().reads, vec![0x018], "live field write reads the register first");
    assert_eq!(lmk.backend().writes, vec![(0x018, 0x82)]);
    assert_eq!(lmk.dirty().count(), 0);
}

#[test]
fn chip_id_is_read_only() {
    let mut lmk = lmk();
    lmk.backend_mut().poke(0x003, 0x06);
    lmk.enable_write(true);
    assert_eq!(lmk.read("CHIP_ID").expect("read"), 0x06);
    assert!(matches!(lmk.write("CHIP_ID", 1), Err(RegError::ReadOnly { .. })));
}

#[test]
fn batch_scope_restores_live_mode() {
    let mut lmk = lmk();
    lmk.enable_write(true);
    lmk.flush_all().expect("initial configuration");
    lmk.backend_mut().writes.clear();

    lmk.batch(|lmk| {
        lmk.write("OUT0_DIV", 4)?;
        lmk.write("PLL_R", 1)?;
        Ok(())
    })
    .expect("batch");
    assert!(lmk.is_live());
    assert_eq!(lmk.backend().writes, vec![(0x018, 0x01), (0x100, 0x04)]);
}

#[test]
fn windowed_backend_offsets_every_register() {
    let src = "A 0x01 7:0 0x5A\n";
    let mut writer = FieldWriter::from_source(WordWindow::new(Recorder::new(0x40), 0x20..0x30), src)
        .expect("definitions load");
    writer.enable_write(true);
    writer.flush_all().expect("flush");
    let recorder = writer.into_backend().into_inner();
    assert_eq!(recorder.writes, vec![(0x21, 0x5A)]);
}

#[test]
fn definitions_survive_emit_and_reparse() {
    let src = std::fs::read_to_string(defs_path("lmk.fields")).expect("lmk.fields readable");
    let defs = parse_field_file(&src).expect("parse");
    let again = parse_field_file(&emit(&defs)).expect("reparse");
    let names = |defs: &[regmap::loader::fielddefs::NamedDef]| -> Vec<String> {
        defs.iter().map(|def| def.name.clone()).collect()
    };
    assert_eq!(names(&again), names(&defs));
    assert!(again.iter().zip(&defs).all(|(a, b)| a.def == b.def));
}
