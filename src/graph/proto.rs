//! Binary `GraphDef` encoding, in the protobuf wire format read by
//! TensorFlow's `tf.compat.v1.GraphDef.ParseFromString`.

use super::{Constant, FrozenGraph, Node, Operation};

/// `VersionDef.producer` written into every exported graph.
pub const GRAPH_DEF_VERSION: i32 = 1286;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum DataType {
    Float = 1,
}

#[derive(Clone, Copy)]
enum WireType {
    Varint = 0,
    LengthDelimited = 2,
}

#[derive(Default)]
struct ProtoWriter {
    buf: Vec<u8>,
}

impl ProtoWriter {
    fn varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }

        self.buf.push(value as u8);
    }

    fn key(&mut self, field: u32, wire: WireType) {
        self.varint(u64::from(field << 3 | wire as u32));
    }

    /// Negative values take the full ten bytes, as protobuf `int64` does.
    fn int64(&mut self, field: u32, value: i64) {
        self.key(field, WireType::Varint);
        self.varint(value as u64);
    }

    fn bool(&mut self, field: u32, value: bool) {
        self.key(field, WireType::Varint);
        self.varint(u64::from(value));
    }

    fn bytes(&mut self, field: u32, value: &[u8]) {
        self.key(field, WireType::LengthDelimited);
        self.varint(value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    fn string(&mut self, field: u32, value: &str) {
        self.bytes(field, value.as_bytes());
    }

    fn message(&mut self, field: u32, f: impl FnOnce(&mut ProtoWriter)) {
        let mut inner = ProtoWriter::default();
        f(&mut inner);
        self.bytes(field, &inner.buf);
    }
}

enum AttrValue<'a> {
    S(&'a str),
    B(bool),
    Type(DataType),
    Shape(Vec<i64>),
    Tensor(&'a Constant),
}

fn write_shape(w: &mut ProtoWriter, dims: &[i64]) {
    for &size in dims {
        w.message(2, |dim| dim.int64(1, size));
    }
}

fn write_tensor(w: &mut ProtoWriter, constant: &Constant) {
    let dims: Vec<_> = constant.dims.iter().map(|&x| x as i64).collect();

    let mut content = Vec::with_capacity(4 * constant.values.len());
    for value in &constant.values {
        content.extend_from_slice(&value.to_le_bytes());
    }

    w.int64(1, DataType::Float as i64);
    w.message(2, |shape| write_shape(shape, &dims));
    w.bytes(4, &content);
}

impl AttrValue<'_> {
    fn write(&self, w: &mut ProtoWriter) {
        match self {
            Self::S(s) => w.string(2, s),
            Self::B(b) => w.bool(5, *b),
            Self::Type(dtype) => w.int64(6, *dtype as i64),
            Self::Shape(dims) => w.message(7, |shape| write_shape(shape, dims)),
            Self::Tensor(constant) => w.message(8, |tensor| write_tensor(tensor, constant)),
        }
    }
}

fn attrs(node: &Node) -> Vec<(&'static str, AttrValue<'_>)> {
    let float = AttrValue::Type(DataType::Float);

    let mut attrs = match &node.op {
        Operation::Placeholder { width } => {
            vec![("dtype", float), ("shape", AttrValue::Shape(vec![-1, *width as i64]))]
        }
        Operation::Const(constant) => vec![("dtype", float), ("value", AttrValue::Tensor(constant))],
        Operation::MatMul => {
            vec![("T", float), ("transpose_a", AttrValue::B(false)), ("transpose_b", AttrValue::B(false))]
        }
        Operation::BiasAdd => vec![("T", float), ("data_format", AttrValue::S("NHWC"))],
        Operation::Activate(_) | Operation::Identity => vec![("T", float)],
    };

    attrs.sort_by_key(|(key, _)| *key);
    attrs
}

fn write_node(w: &mut ProtoWriter, node: &Node) {
    w.string(1, &node.name);
    w.string(2, node.op.op_name());

    for input in &node.inputs {
        w.string(3, input);
    }

    for (key, value) in attrs(node) {
        w.message(5, |entry| {
            entry.string(1, key);
            entry.message(2, |attr| value.write(attr));
        });
    }
}

/// Serialises `graph` as a binary `GraphDef`.
pub fn encode_graph_def(graph: &FrozenGraph) -> Vec<u8> {
    let mut w = ProtoWriter::default();

    for node in graph.nodes() {
        w.message(1, |def| write_node(def, node));
    }

    w.message(4, |versions| versions.int64(1, i64::from(GRAPH_DEF_VERSION)));

    w.buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{activation::Activation, model::ModelBuilder};

    #[test]
    fn varints() {
        let mut w = ProtoWriter::default();
        w.varint(1);
        w.varint(300);
        assert_eq!(w.buf, [0x01, 0xAC, 0x02]);
    }

    #[test]
    fn negative_int64() {
        let mut w = ProtoWriter::default();
        w.int64(1, -1);
        assert_eq!(w.buf, [0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
    }

    #[test]
    fn nested_message() {
        let mut w = ProtoWriter::default();
        w.message(4, |versions| versions.int64(1, 1286));
        assert_eq!(w.buf, [0x22, 0x03, 0x08, 0x86, 0x0A]);
    }

    #[test]
    fn placeholder_node() {
        let node = Node::new("x", Operation::Placeholder { width: 8 }, &[]);
        let mut w = ProtoWriter::default();
        write_node(&mut w, &node);

        let mut expected = vec![0x0A, 0x01, b'x', 0x12, 0x0B];
        expected.extend_from_slice(b"Placeholder");
        // attr { key: "dtype" value { type: DT_FLOAT } }
        expected.extend_from_slice(&[0x2A, 0x0B, 0x0A, 0x05]);
        expected.extend_from_slice(b"dtype");
        expected.extend_from_slice(&[0x12, 0x02, 0x30, 0x01]);
        // attr { key: "shape" value { shape { dim { size: -1 } dim { size: 8 } } } }
        expected.extend_from_slice(&[0x2A, 0x1C, 0x0A, 0x05]);
        expected.extend_from_slice(b"shape");
        expected.extend_from_slice(&[0x12, 0x13, 0x3A, 0x11, 0x12, 0x0B, 0x08]);
        expected.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        expected.extend_from_slice(&[0x12, 0x02, 0x08, 0x08]);

        assert_eq!(w.buf, expected);
    }

    #[test]
    fn attrs_are_sorted() {
        let node = Node::new("m", Operation::MatMul, &["a", "b"]);
        let keys: Vec<_> = attrs(&node).into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["T", "transpose_a", "transpose_b"]);
    }

    #[test]
    fn tensor_content_is_little_endian() {
        let constant = Constant::vector(&[1.0, -2.5]);
        let mut w = ProtoWriter::default();
        write_tensor(&mut w, &constant);

        let mut content = 1.0f32.to_le_bytes().to_vec();
        content.extend_from_slice(&(-2.5f32).to_le_bytes());

        assert!(w.buf.starts_with(&[0x08, 0x01, 0x12, 0x04, 0x12, 0x02, 0x08, 0x02, 0x22, 0x08]));
        assert!(w.buf.ends_with(&content));
    }

    #[test]
    fn whole_graph() {
        let model = ModelBuilder::default().input(2).dense("out", 1, Activation::Sigmoid).seed(0).build();
        let graph = FrozenGraph::freeze(&model);
        let bytes = encode_graph_def(&graph);

        assert_eq!(bytes[0], 0x0A);
        assert!(bytes.ends_with(&[0x22, 0x03, 0x08, 0x86, 0x0A]));

        for node in graph.nodes() {
            let name = node.name.as_bytes();
            assert!(bytes.windows(name.len()).any(|window| window == name), "{} missing", node.name);
        }
    }
}
