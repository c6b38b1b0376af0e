use bytes::BytesMut;
use nbtr::{PrettyPrint, Reader, Writer};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<i8>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Str(String),
    IntList(Vec<i32>),
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i8>().prop_map(Value::Byte),
        any::<i16>().prop_map(Value::Short),
        any::<i32>().prop_map(Value::Int),
        any::<i64>().prop_map(Value::Long),
        any::<f32>().prop_filter("finite", |v| v.is_finite()).prop_map(Value::Float),
        any::<f64>().prop_filter("finite", |v| v.is_finite()).prop_map(Value::Double),
        prop::collection::vec(any::<i8>(), 0..16).prop_map(Value::Bytes),
        prop::collection::vec(any::<i32>(), 0..16).prop_map(Value::Ints),
        prop::collection::vec(any::<i64>(), 0..16).prop_map(Value::Longs),
        ".{0,24}".prop_map(Value::Str),
        prop::collection::vec(any::<i32>(), 0..16).prop_map(Value::IntList),
    ]
}

fn write_all(values: &[Value]) -> Writer {
    let mut writer = Writer::new();
    for (i, value) in values.iter().enumerate() {
        let name = format!("k{i}");
        let written = match value {
            Value::Byte(v) => writer.write_byte(*v, &name),
            Value::Short(v) => writer.write_short(*v, &name),
            Value::Int(v) => writer.write_int(*v, &name),
            Value::Long(v) => writer.write_long(*v, &name),
            Value::Float(v) => writer.write_float(*v, &name),
            Value::Double(v) => writer.write_double(*v, &name),
            Value::Bytes(v) => writer.write_byte_array(v, &name),
            Value::Ints(v) => writer.write_int_array(v, &name),
            Value::Longs(v) => writer.write_long_array(v, &name),
            Value::Str(v) => writer.write_string(v, &name),
            Value::IntList(v) => {
                writer.begin_list(&name).unwrap();
                for x in v {
                    writer.write_int(*x, "").unwrap();
                }
                writer.end_list()
            }
        };
        written.unwrap();
    }
    writer.end().unwrap();
    writer
}

fn read_all(reader: &mut Reader, expected: &[Value]) -> Vec<Value> {
    expected
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            let name = format!("k{i}");
            match shape {
                Value::Byte(_) => Value::Byte(reader.read_byte(&name).unwrap()),
                Value::Short(_) => Value::Short(reader.read_short(&name).unwrap()),
                Value::Int(_) => Value::Int(reader.read_int(&name).unwrap()),
                Value::Long(_) => Value::Long(reader.read_long(&name).unwrap()),
                Value::Float(_) => Value::Float(reader.read_float(&name).unwrap()),
                Value::Double(_) => Value::Double(reader.read_double(&name).unwrap()),
                Value::Bytes(_) => Value::Bytes(reader.read_byte_array(&name).unwrap()),
                Value::Ints(_) => Value::Ints(reader.read_int_array(&name).unwrap()),
                Value::Longs(_) => Value::Longs(reader.read_long_array(&name).unwrap()),
                Value::Str(_) => Value::Str(reader.read_string(&name).unwrap()),
                Value::IntList(_) => {
                    reader.open_list(&name).unwrap();
                    let items = (0..reader.list_size().unwrap())
                        .map(|_| reader.read_int("").unwrap())
                        .collect();
                    reader.close_list().unwrap();
                    Value::IntList(items)
                }
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn fuzz_import_bin_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        let mut reader = Reader::new();
        if reader.import_bin(&bytes).is_err() {
            prop_assert!(reader.store().is_empty());
        }
    }

    #[test]
    fn fuzz_import_bin_valid_header_garbage_body(
        body in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let mut data = vec![0x0A, 0x00, 0x00];
        data.extend_from_slice(&body);
        let mut reader = Reader::new();
        let _ = reader.import_bin(&data);
    }

    #[test]
    fn fuzz_import_string_no_panics(text in "\\PC{0,256}") {
        let mut reader = Reader::new();
        let _ = reader.import_string(&text);
    }

    #[test]
    fn fuzz_import_text_alphabet_no_panics(text in "[{}\\[\\]:,;\"'\\\\BILbslfd0-9.+\\- a-z]{0,128}") {
        let mut reader = Reader::new();
        let _ = reader.import_bytes(text.as_bytes());
    }

    #[test]
    fn binary_round_trip(values in prop::collection::vec(value(), 0..12)) {
        let writer = write_all(&values);
        let mut buf = BytesMut::new();
        writer.export_bin(&mut buf).unwrap();

        let mut reader = Reader::new();
        reader.import_bin(&buf).unwrap();
        prop_assert_eq!(read_all(&mut reader, &values), values);
    }

    #[test]
    fn text_round_trip(values in prop::collection::vec(value(), 0..12), pretty in any::<bool>()) {
        let writer = write_all(&values);
        let pretty = if pretty { PrettyPrint::Enabled } else { PrettyPrint::Disabled };
        let mut text = String::new();
        writer.export_string(&mut text, pretty).unwrap();

        let mut reader = Reader::new();
        reader.import_string(&text).unwrap();
        prop_assert_eq!(read_all(&mut reader, &values), values);
    }
}
