//! Order-preservation invariant: loading then re-serializing a stream
//! reproduces the original label/instruction sequence.

use proptest::prelude::*;

use ss_program::load;

/// Build a well-formed stream from generated narration texts and jump picks.
///
/// Each instruction gets a label `l<i>`; each `goto` picks one of those
/// labels, so every branch target resolves by construction.
fn build_stream(texts: &[String], jumps: &[prop::sample::Index]) -> String {
    let mut out = String::new();
    for (i, text) in texts.iter().enumerate() {
        out.push_str(&format!("l{i}:\n"));
        out.push_str(&format!("narrate(\"{text}\")\n"));
    }
    for jump in jumps {
        let target = jump.index(texts.len());
        out.push_str(&format!("goto(l{target})\n"));
    }
    out.push_str("end()\n");
    out
}

proptest! {
    #[test]
    fn load_serialize_round_trip(
        texts in prop::collection::vec("[a-zA-Z ]{0,16}", 1..8),
        jumps in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let source = build_stream(&texts, &jumps);
        let program = load(&source).expect("generated stream must load");

        // Re-serialization reproduces the stream byte for byte.
        prop_assert_eq!(program.to_stream(), source);

        // And the round-tripped stream loads to an identical program.
        let reloaded = load(&program.to_stream()).expect("round-tripped stream must load");
        prop_assert_eq!(&reloaded, &program);

        // Order preservation: labels resolve to ascending instruction indices.
        for (i, _) in texts.iter().enumerate() {
            prop_assert_eq!(program.label_index(&format!("l{i}")), Some(i));
        }
    }
}

#[test]
fn every_label_resolves_to_a_valid_index() {
    let source = "start:\nnarrate(\"a\")\nmid:\ngoto(start)\nfin:\nend()\n";
    let program = load(source).unwrap();
    for label in program.labels() {
        // A label index is at most one past the last instruction.
        assert!(label.index <= program.len());
        assert_eq!(program.label_index(&label.name), Some(label.index));
    }
}
