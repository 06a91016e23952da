use float_cmp::assert_approx_eq;

use pdpatch_core::model::{
    CanvasId, DataBlockKind, FieldKind, NodeKind, Payload, WidgetKind,
};
use pdpatch_parser::{error::ErrorCode, parse};

fn codes(source: &str) -> Vec<ErrorCode> {
    let err = parse(source, "test").expect_err("parse should fail");
    err.errors().filter_map(|diag| diag.code()).collect()
}

#[test]
fn test_simple_patch() {
    let source = "#N canvas 0 22 450 300 12;\r\n\
                  #X obj 10 10 loadbang;\r\n\
                  #X obj 10 30 print;\r\n\
                  #X connect 0 0 1 0;\r\n";

    let patch = parse(source, "simple").expect("Failed to parse");
    let root = patch.root();

    assert_eq!(patch.name(), "simple");
    assert_approx_eq!(f32, root.font(), 12.0);
    assert_approx_eq!(f32, root.screen().y(), 22.0);
    assert_approx_eq!(f32, root.size().width(), 450.0);

    let ids: Vec<_> = root.nodes().iter().map(|node| node.id()).collect();
    assert_eq!(ids, [0, 1]);

    match root.nodes()[1].kind() {
        NodeKind::Object(object) => {
            assert_eq!(object.class(), "print");
            assert!(object.args().is_empty());
        }
        other => panic!("Expected object, got {other:?}"),
    }
    let position = root.nodes()[1].position().unwrap();
    assert_approx_eq!(f32, position.y(), 30.0);

    assert_eq!(root.connections().len(), 1);
    let connection = root.connections()[0];
    assert_eq!((connection.source(), connection.sink()), (0, 1));
}

#[test]
fn test_subpatch_restore() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #X obj 10 10 inlet;\n\
                  #N canvas 100 100 300 200 inner 0;\n\
                  #X obj 10 10 outlet~;\n\
                  #X restore 40 60 pd inner, f 14;\n\
                  #X connect 0 0 1 0;\n";

    let patch = parse(source, "nested").expect("Failed to parse");
    let root = patch.root();

    assert_eq!(root.nodes().len(), 2);
    let sub = &root.nodes()[1];
    assert_eq!(sub.id(), 1);
    let position = sub.position().unwrap();
    assert_approx_eq!(f32, position.x(), 40.0);
    assert_approx_eq!(f32, position.y(), 60.0);

    let canvas = patch.canvas(sub.subpatch().unwrap()).unwrap();
    assert_eq!(canvas.name(), "inner");
    assert!(!canvas.is_visible());
    assert_eq!(canvas.parent(), Some(CanvasId::ROOT));
    assert_eq!(canvas.title(), ["pd", "inner"]);
    assert_eq!(canvas.border(), Some(14));
    assert_eq!(canvas.nodes().len(), 1);
    assert_eq!(root.connections().len(), 1);
}

#[test]
fn test_border_after_restore() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #N canvas 0 0 100 100 sub 0;\n\
                  #X restore 10 10 pd sub;\n\
                  #X f 20;\n";

    let patch = parse(source, "p").unwrap();
    let canvas = patch.canvas(patch.root().nodes()[0].subpatch().unwrap()).unwrap();
    assert_eq!(canvas.border(), Some(20));
}

#[test]
fn test_comments_consume_indices() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #X text 10 10 hello \\, world;\n\
                  #X obj 10 40 f, f 6;\n\
                  #X text 10 80 second;\n\
                  #X f 30;\n\
                  #X msg 10 60 bang;\n";

    let patch = parse(source, "p").unwrap();
    let root = patch.root();

    assert_eq!(root.comments().len(), 2);
    assert_eq!(root.comments()[0].atoms(), ["hello", ",", "world"]);
    assert_eq!(root.comments()[1].border(), Some(30));

    let ids: Vec<_> = root.nodes().iter().map(|node| node.id()).collect();
    assert_eq!(ids, [1, 3]);
    assert_eq!(root.nodes()[0].border(), Some(6));
}

#[test]
fn test_message_targets() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #X msg 10 10 1 \\, 2 \\; pd dsp 1;\n";

    let patch = parse(source, "p").unwrap();
    let NodeKind::Message(message) = patch.root().nodes()[0].kind() else {
        panic!("Expected message");
    };

    assert_eq!(message.targets().len(), 2);
    assert!(message.targets()[0].is_outlet());
    assert_eq!(message.targets()[0].messages().len(), 2);
    assert_eq!(message.targets()[1].address(), Some("pd"));
    assert_eq!(message.targets()[1].messages()[0], ["dsp", "1"]);
}

#[test]
fn test_widgets_and_data_blocks() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #X floatatom 10 10 5 0 0 0 - - - 0;\n\
                  #X obj 10 40 tgl 15 0 empty empty empty 17 7 0 10 #fcfcfc #000000 #000000 0 1;\n\
                  #X obj 10 80 text define -k notes;\n\
                  #A set 1 2 \\; 3 4 \\;;\n\
                  #X obj 10 120;\n";

    let patch = parse(source, "p").unwrap();
    let nodes = patch.root().nodes();
    assert_eq!(nodes.len(), 4);

    match nodes[0].kind() {
        NodeKind::Widget(widget) => assert_eq!(widget.kind(), WidgetKind::FloatAtom),
        other => panic!("Expected floatatom, got {other:?}"),
    }
    match nodes[1].kind() {
        NodeKind::Widget(widget) => {
            assert_eq!(widget.kind(), WidgetKind::Toggle);
            assert_eq!(widget.fields()[9], "#fcfcfc");
        }
        other => panic!("Expected toggle, got {other:?}"),
    }
    match nodes[2].kind() {
        NodeKind::DataBlock(block) => {
            assert_eq!(block.kind(), DataBlockKind::Text);
            assert_eq!(block.args(), ["define", "-k", "notes"]);
        }
        other => panic!("Expected text block, got {other:?}"),
    }
    assert_eq!(
        nodes[2].data(),
        [Payload::Set {
            rows: vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string(), "4".to_string()],
            ]
        }]
    );
    match nodes[3].kind() {
        NodeKind::Object(object) => assert_eq!(object.class(), ""),
        other => panic!("Expected empty object, got {other:?}"),
    }
}

#[test]
fn test_struct_and_scalar() {
    let source = "#N struct pt float x float y;\n\
                  #N struct shape float x float y symbol color array points pt;\n\
                  #N canvas 0 22 450 300 12;\n\
                  #X scalar shape 10 20 red \\; 0 0 \\; 5 8 \\; \\;;\n";

    let patch = parse(source, "p").unwrap();

    assert_eq!(patch.templates().len(), 2);
    let shape = patch.template("shape").unwrap();
    assert_eq!(
        shape.fields()[3].kind(),
        &FieldKind::Array {
            template: "pt".to_string()
        }
    );

    let node = &patch.root().nodes()[0];
    assert!(node.position().is_none());
    let NodeKind::Scalar(scalar) = node.kind() else {
        panic!("Expected scalar");
    };
    assert_eq!(scalar.template(), "shape");
    let data = scalar.data().unwrap();
    assert_approx_eq!(f32, data.float("y").unwrap(), 20.0);
    assert_eq!(data.symbol("color"), Some("red"));
    let points = data.array("points").unwrap();
    assert_eq!(points.elements().len(), 2);
    assert_approx_eq!(f32, points.elements()[1].float("x").unwrap(), 5.0);
}

#[test]
fn test_scalar_of_undefined_template_keeps_node() {
    let source = "#N canvas 0 22 450 300 12;\n#X scalar ghost 1 2 \\;;\n";

    let patch = parse(source, "p").unwrap();
    let NodeKind::Scalar(scalar) = patch.root().nodes()[0].kind() else {
        panic!("Expected scalar");
    };
    assert!(scalar.data().is_none());
}

#[test]
fn test_gop_array() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #N canvas 0 22 450 278 (subpatch) 0;\n\
                  #X array table 4 float 3;\n\
                  #A 0 0.5 -1 0 1e-3;\n\
                  #X coords 0 1 4 -1 200 140 1 0 0;\n\
                  #X restore 20 20 graph;\n";

    let patch = parse(source, "p").unwrap();
    let canvas = patch
        .canvas(patch.root().nodes()[0].subpatch().unwrap())
        .unwrap();

    assert!(canvas.is_graph_on_parent());
    assert_eq!(canvas.coords().unwrap().values().len(), 9);

    let array = &canvas.nodes()[0];
    let NodeKind::GopArray(gop) = array.kind() else {
        panic!("Expected array");
    };
    assert_eq!(gop.length(), 4);
    assert!(gop.saves_contents());
    let [Payload::Floats { offset, values }] = array.data() else {
        panic!("Expected one float chunk");
    };
    assert_eq!(*offset, 0);
    assert_approx_eq!(f32, values[1], -1.0);
    assert_approx_eq!(f32, values[3], 0.001);
}

#[test]
fn test_legacy_graph() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #X graph graph1 0 -1 3 1 100 20 300 150;\n\
                  #X array a1 3 float;\n\
                  #A 0 1 2 3;\n\
                  #X array a2 2 float;\n\
                  #X pop;\n\
                  #X obj 10 10 f;\n";

    let patch = parse(source, "p").unwrap();
    let nodes = patch.root().nodes();
    assert_eq!(nodes.len(), 2);

    let NodeKind::Graph(graph) = nodes[0].kind() else {
        panic!("Expected graph");
    };
    assert_eq!(graph.arrays().len(), 2);
    assert_eq!(graph.arrays()[0].data().len(), 1);
    assert!(graph.arrays()[1].data().is_empty());
    assert_approx_eq!(f32, graph.area().end().x(), 300.0);
}

#[test]
fn test_declare_merges() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #X declare -path abs -lib zexy;\n\
                  #X declare -path more;\n";

    let patch = parse(source, "p").unwrap();
    let deps = patch.dependencies().unwrap();
    assert_eq!(deps.paths(), ["abs", "more"]);
    assert_eq!(deps.libs(), ["zexy"]);
}

#[test]
fn test_recoverable_statements_are_skipped() {
    let source = "#X obj 1 1 orphan;\n\
                  #N canvas 0 22 450 300 12;\n\
                  #X obj 10 10 loadbang;\n\
                  #X bogus 1 2 3;\n\
                  #X connect 0 0;\n\
                  #X obj ten 10 print;\n\
                  #X coords 1 2 3;\n\
                  #Z what;\n\
                  #X obj 10 50 print;\n\
                  #X connect 0 0 1 0";

    let patch = parse(source, "p").unwrap();
    let root = patch.root();
    assert_eq!(root.nodes().len(), 2);
    assert_eq!(root.connections().len(), 1);
    assert!(root.coords().is_none());
}

#[test]
fn test_connection_ports_beyond_32_bits_are_dropped() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #X obj 10 10 loadbang;\n\
                  #X obj 10 50 print;\n\
                  #X connect 0 4294967296 1 0;\n\
                  #X connect 0 0 1 4294967296;\n\
                  #X connect 0 0 1 0;\n";

    let patch = parse(source, "p").unwrap();
    let connections = patch.root().connections();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].outlet(), 0);
    assert_eq!(connections[0].inlet(), 0);
}

#[test]
fn test_unbalanced_canvas_stack() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #N canvas 0 0 100 100 open 1;\n\
                  #X obj 10 10 f;\n";

    assert_eq!(codes(source), [ErrorCode::E103]);

    let err = parse(source, "p").unwrap_err();
    let diag = err.errors().next().unwrap();
    assert_eq!(diag.labels().len(), 2);
    assert!(diag.labels()[1].is_secondary());
}

#[test]
fn test_restore_without_open_subpatch() {
    let source = "#N canvas 0 22 450 300 12;\n#X restore 0 0 pd nothing;\n";
    assert_eq!(codes(source), [ErrorCode::E102]);
}

#[test]
fn test_missing_root_canvas() {
    assert_eq!(codes("#X obj 1 1 f;\n"), [ErrorCode::E104]);
    assert_eq!(codes(""), [ErrorCode::E104]);
}

#[test]
fn test_malformed_patch_name() {
    let err = parse("#N canvas 0 22 450 300 12;\n", "bad|name").unwrap_err();
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E105));
}

#[test]
fn test_escapes_are_resolved() {
    let source = "#N canvas 0 22 450 300 12;\n\
                  #X obj 10 10 r \\$0-in;\n\
                  #N canvas 0 0 100 100 my\\ sub 0;\n\
                  #X restore 10 40 pd my\\ sub;\n";

    let patch = parse(source, "p").unwrap();
    let NodeKind::Object(object) = patch.root().nodes()[0].kind() else {
        panic!("Expected object");
    };
    assert_eq!(object.args(), ["$0-in"]);

    let canvas = patch.canvas(patch.root().nodes()[1].subpatch().unwrap()).unwrap();
    assert_eq!(canvas.name(), "my sub");
    assert_eq!(canvas.title(), ["pd", "my sub"]);
}
