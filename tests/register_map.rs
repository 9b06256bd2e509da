mod common;

use common::{Recorder, defs_path};
use regmap::soc::regs::ast::Mode;
use regmap::{Accessor, DefinitionLoader, ParseOptions, RegError, RegisterMap, Seed};

fn board() -> RegisterMap<Recorder> {
    let mut loader = DefinitionLoader::new(ParseOptions { warn: false });
    loader
        .load_file(defs_path("common.regs"))
        .expect("common.regs loads")
        .load_file(defs_path("board.regs"))
        .expect("board.regs loads");
    let flat = loader.flatten().expect("board flattens");
    assert_eq!(flat.constant("IRQ_LINE"), Some(7), "constants from the include survive");
    assert_eq!(flat.constant("BOARD_REV"), Some(3));
    let group = flat.group("BOARD").expect("BOARD group");
    assert_eq!(group.span, 18);
    assert_eq!(group.doc, vec![" Acquisition board".to_string()]);
    RegisterMap::new(group, Recorder::new(group.span as usize)).expect("map builds")
}

#[test]
fn shared_blocks_land_at_their_instance_addresses() {
    let map = board();
    let address = |path: &str| map.register(path).expect(path).address();
    assert_eq!(address("IRQ.STATUS"), 2);
    assert_eq!(address("DMA_IRQ.STATUS"), 5);
    assert_eq!(address("DMA_IRQ.ACK"), 7);
    assert_eq!(address("CLOCKS[0]"), 8);
    assert_eq!(address("REF_CLK"), 12);
    assert_eq!(address("FIFO_FLUSH"), 13);
    assert_eq!(address("SENSOR[1]"), 14);
    assert_eq!(address("CAPTURE_HI"), 16);
    assert_eq!(address("SCRATCH"), 17);

    let ref_clk = map.register("REF_CLK").expect("REF_CLK");
    let names: Vec<&str> = map.fields_of(ref_clk).iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["DIV", "BYPASS", "PHASE", "LOCKED"], "template fields first");
}

#[test]
fn irq_acknowledge_is_a_pulse() {
    let mut map = board();
    let ack = map.register("DMA_IRQ.ACK").expect("ACK");
    assert_eq!(map.mode(ack), Mode::WP);
    map.write(ack, 0b10).expect("acknowledge");
    assert_eq!(map.read(ack).expect("read"), 0);
    assert_eq!(map.backend().writes, vec![(7, 0b10)]);
    assert!(map.backend().reads.is_empty(), "pulse registers are never read");
}

#[test]
fn status_fields_follow_hardware() {
    let mut map = board();
    let status = map.register("IRQ.STATUS").expect("STATUS");
    map.backend_mut().poke(2, 0b1110);
    assert_eq!(map.read_field(status, "FIFO").expect("FIFO"), 0b11);
    assert_eq!(map.read_field(status, "DMA_DONE").expect("DMA_DONE"), 1);
    assert!(matches!(
        map.write_field(status, "FIFO", 1),
        Err(RegError::ReadOnly { .. })
    ));
}

#[test]
fn control_update_is_one_read_and_one_write() {
    let mut map = board();
    let control = map.register("CONTROL").expect("CONTROL");
    map.backend_mut().poke(1, 0x0000_0F00);
    map.write_fields(control, Seed::Current, &[("RUN", 1), ("RESET", 1)])
        .expect("update");
    assert_eq!(map.backend().reads, vec![1]);
    assert_eq!(map.backend().writes, vec![(1, 0x0000_0F03)]);
    assert_eq!(
        map.describe(control).expect("describe"),
        "<Reg CONTROL @1 RUN = 1, RESET = 1, CHANNELS = 15>"
    );
}

#[test]
fn sensor_overlay_members_share_the_address() {
    let mut map = board();
    let sensor = map.resolve("SENSOR").expect("SENSOR");
    assert!(matches!(sensor, Accessor::Overlay(_)));
    let temp = map.register("SENSOR.SENSOR_TEMP").expect("temperature");
    let volt = map.register("SENSOR[1]").expect("voltage");
    map.write_field(temp, "TEMP", 0x123).expect("temp");
    assert_eq!(map.read_field(volt, "VOLT").expect("volt"), 0x123, "same physical word");
    assert_eq!(map.backend().peek(14), 0x123);
}

#[test]
fn array_elements_are_independent() {
    let mut map = board();
    for index in 0..4 {
        let clock = map.register(&format!("CLOCKS[{index}]")).expect("element");
        map.write_field(clock, "DIV", 10 + index).expect("DIV");
    }
    assert_eq!(map.backend().peek(8), 10);
    assert_eq!(map.backend().peek(11), 13);
    assert!(matches!(map.resolve("CLOCKS[4]"), Err(RegError::IndexOutOfRange { .. })));
}

#[test]
fn missing_definition_file_is_reported() {
    let mut loader = DefinitionLoader::default();
    let err = loader
        .load_file(defs_path("missing.regs"))
        .expect_err("file is absent");
    assert!(matches!(err, RegError::Io(_)));
}
