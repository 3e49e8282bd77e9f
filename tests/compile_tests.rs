/// Compiler integration tests: splitting, ordering and byte layout.

use grf_townnames::core::compiler::{compile, CompileError, MAX_ALTERNATIVES};
use grf_townnames::core::grammar::{Alternative, Node, Part};
use grf_townnames::core::pipeline::{PipelineError, TownNameGrf};
use grf_townnames::core::reader::{read_blocks, read_grf};
use grf_townnames::schema::language::Language;
use grf_townnames::schema::metadata::GrfMetadata;

fn meta() -> GrfMetadata {
    GrfMetadata::new(*b"Tst\x01", "Test Names", "Integration test grammar")
}

fn numbered(count: usize) -> Part {
    Part::literals((0..count).map(|i| format!("Ville{i}")))
}

/// Content of the n-th town-name record in a compiled file.
fn record(bytes: &[u8], n: usize) -> Vec<u8> {
    let blocks = read_blocks(bytes).unwrap();
    // count, Action 14, Action 8, then records
    blocks[3 + n].data.to_vec()
}

#[test]
fn scenario_single_node_two_literals() {
    let root = Node::new(
        "root",
        0,
        vec![Part::new(vec![
            Alternative::literal("Aix"),
            Alternative::literal("Caen").with_weight(3),
        ])],
    );
    let grf = TownNameGrf::builder()
        .with_metadata(meta())
        .with_node(root)
        .build()
        .unwrap();

    let mut expected = vec![
        0x0F, 0x00, // action, handle 0
        0x01, // one part
        0x02, 0x00, 0x02, // two entries, start 0, width ceil(log2(4))
    ];
    expected.extend_from_slice(&[0x01, 0xC3, 0x9E]);
    expected.extend_from_slice(b"Aix\0");
    expected.extend_from_slice(&[0x03, 0xC3, 0x9E]);
    expected.extend_from_slice(b"Caen\0");

    assert_eq!(record(grf.bytes(), 0), expected);
}

#[test]
fn scenario_split_300_literals() {
    let node = Node::new("big", 2, vec![numbered(300)]);
    let compiled = compile(&[node]).unwrap();

    assert_eq!(compiled.len(), 3);
    let helpers = &compiled.nodes()[..2];
    let sizes: Vec<usize> = helpers.iter().map(|n| n.parts[0].len()).collect();
    assert_eq!(sizes.iter().sum::<usize>(), 300);
    assert!(sizes.iter().all(|&s| s <= MAX_ALTERNATIVES));

    let parent = compiled.node("big").unwrap();
    let refs = &parent.parts[0].alternatives;
    assert_eq!(refs.len(), 2);
    assert!(refs.iter().all(|a| a.target().is_some()));
    assert_eq!(refs.iter().map(Alternative::weight).sum::<u32>(), 300);
}

#[test]
fn scenario_reference_handles() {
    let a = Node::new("a", 0, vec![Part::literals(["Aix"])]);
    let b = Node::new(
        "b",
        0,
        vec![Part::new(vec![Alternative::reference("a")])],
    );
    let grf = TownNameGrf::builder()
        .with_metadata(meta())
        .with_nodes([a, b])
        .build()
        .unwrap();

    let rec_a = record(grf.bytes(), 0);
    let rec_b = record(grf.bytes(), 1);
    assert_eq!(rec_a[1], 0x00);
    assert_eq!(rec_b[1], 0x01);
    // one part: one entry, start 0, width 0, then the reference
    assert_eq!(&rec_b[2..], &[0x01, 0x01, 0x00, 0x00, 0x81, 0x00]);
}

#[test]
fn capacity_invariant_holds_after_compile() {
    let nodes = vec![
        Node::new("small", 0, vec![Part::literals(["a", "b"])]),
        Node::new("huge", 4, vec![numbered(1000), numbered(256)]),
        Node::new(
            "root",
            0,
            vec![Part::new(vec![
                Alternative::reference("small"),
                Alternative::reference("huge"),
            ])],
        ),
    ];
    let compiled = compile(&nodes).unwrap();
    for node in compiled.nodes() {
        for part in &node.parts {
            assert!(!part.is_empty() && part.len() <= MAX_ALTERNATIVES, "{}", node.id);
        }
    }
}

#[test]
fn weight_conservation_for_every_split() {
    for count in [256, 300, 509, 510, 511, 1000] {
        let compiled = compile(&[Node::new("n", 0, vec![numbered(count)])]).unwrap();
        let parent = compiled.node("n").unwrap();
        assert_eq!(parent.parts[0].total_weight(), count as u64, "count {count}");
        assert_eq!(
            parent.parts[0].len(),
            count.div_ceil(MAX_ALTERNATIVES),
            "count {count}"
        );
    }
}

#[test]
fn forward_reference_fails_then_succeeds_reordered() {
    let leaf = Node::new("leaf", 0, vec![Part::literals(["x"])]);
    let user = Node::new("user", 0, vec![Part::new(vec![Alternative::reference("leaf")])]);

    let err = compile(&[user.clone(), leaf.clone()]).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnresolvedReference {
            node: "user".to_string(),
            target: "leaf".to_string()
        }
    );
    assert!(compile(&[leaf, user]).is_ok());
}

#[test]
fn output_is_deterministic() {
    let build = || {
        TownNameGrf::builder()
            .with_metadata(meta())
            .with_node(Node::new("big", 2, vec![numbered(300)]))
            .with_node(
                Node::new(
                    "root",
                    0,
                    vec![Part::new(vec![Alternative::reference("big")])],
                )
                .with_display_name(Language::FRENCH, "Racine")
                .with_display_name(Language::ENGLISH, "Root"),
            )
            .build()
            .unwrap()
            .into_bytes()
    };
    assert_eq!(build(), build());
}

#[test]
fn heavy_split_references_are_spread_on_emission() {
    let grf = TownNameGrf::builder()
        .with_metadata(meta())
        .with_node(Node::new("big", 2, vec![numbered(300)]))
        .build()
        .unwrap();

    // helpers are records 0 and 1, the parent record 2
    let parent = record(grf.bytes(), 2);
    // 255 becomes 127 + 127 + 1, then 45: four entries, width 9
    assert_eq!(&parent[2..6], &[0x01, 0x04, 0x02, 0x09]);
    assert_eq!(
        &parent[6..],
        &[0xFF, 0x00, 0xFF, 0x00, 0x81, 0x00, 0xAD, 0x01]
    );
}

#[test]
fn too_many_records() {
    let nodes: Vec<Node> = (0..129)
        .map(|i| Node::new(format!("n{i}"), 0, vec![Part::literals(["x"])]))
        .collect();
    let compiled = compile(&nodes).unwrap();
    assert!(matches!(
        compiled.emit(),
        Err(CompileError::RegistryFull { .. })
    ));
}

#[test]
fn heavy_alternatives_compile_and_read_back() {
    let alts = (0..200)
        .map(|i| Alternative::literal(format!("Ville{i}")).with_weight(128))
        .collect();
    let grf = TownNameGrf::builder()
        .with_metadata(meta())
        .with_node(
            Node::new("heavy", 0, vec![Part::new(alts)])
                .with_display_name(Language::ENGLISH, "Heavy"),
        )
        .build()
        .unwrap();

    let decoded = read_grf(grf.bytes()).unwrap();
    assert_eq!(decoded.records.len(), 3);
    for record in &decoded.records {
        for part in &record.parts {
            assert!(part.entries.len() <= MAX_ALTERNATIVES);
        }
    }
    // the parent's references carry the 400 spread entries
    assert_eq!(decoded.records[2].parts[0].total_weight(), 400);
}

#[test]
fn node_with_too_many_parts_fails_to_build() {
    let parts = (0..256).map(|i| Part::literals([format!("{i}")])).collect();
    let err = TownNameGrf::builder()
        .with_metadata(meta())
        .with_node(Node::new("wide", 0, parts))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Compile(CompileError::TooManyParts { count: 256, .. })
    ));
}

#[test]
fn user_id_taken_by_a_split() {
    let err = compile(&[
        Node::new("big", 0, vec![numbered(300)]),
        Node::new("big__0_0", 0, vec![Part::literals(["x"])]),
    ])
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::SynthesizedIdCollision {
            node: "big".to_string(),
            id: "big__0_0".to_string()
        }
    );
}
