//! Encodes a small document graph, hex-dumps the stream, and decodes it
//! back, printing what survived the round trip.

use std::cell::RefCell;
use std::rc::Rc;

use graphwire::{DecodeError, Decoder, Encoder, Registry, StructStart};

/// A document that can point at a related document.
#[derive(Debug, Default)]
struct Doc {
    title: String,
    related: Option<Rc<RefCell<Doc>>>,
}

const FIELD_TITLE: u64 = 0;
const FIELD_RELATED: u64 = 1;

fn encode_doc(e: &mut Encoder<'_>, doc: Option<&Rc<RefCell<Doc>>>) {
    if !e.start_struct(doc) {
        return;
    }
    let d = doc.expect("start_struct proceeds only on a present pointer").borrow();
    if !d.title.is_empty() {
        e.encode_uint(FIELD_TITLE);
        e.encode_string(&d.title);
    }
    if let Some(related) = &d.related {
        e.encode_uint(FIELD_RELATED);
        encode_doc(e, Some(related));
    }
    e.end_struct();
}

fn decode_doc(d: &mut Decoder<'_>) -> Result<Option<Rc<RefCell<Doc>>>, DecodeError> {
    match d.start_struct()? {
        StructStart::Nil => Ok(None),
        StructStart::Ref(record) => Ok(Some(
            record
                .downcast::<RefCell<Doc>>()
                .map_err(|_| DecodeError::RefTypeMismatch { context: "Doc" })?,
        )),
        StructStart::New => {
            let doc = Rc::new(RefCell::new(Doc::default()));
            d.store_ref(doc.clone());
            while let Some(field) = d.next_struct_field()? {
                match field {
                    FIELD_TITLE => {
                        let v = d.decode_string()?.to_owned();
                        doc.borrow_mut().title = v;
                    }
                    FIELD_RELATED => {
                        let v = decode_doc(d)?;
                        doc.borrow_mut().related = v;
                    }
                    num => d.unknown_field("Doc", num)?,
                }
            }
            Ok(Some(doc))
        }
    }
}

fn hex_dump(bytes: &[u8]) {
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..0x7f).contains(&b) { b as char } else { '.' })
            .collect();
        println!("  {:04x}  {:<47}  |{}|", i * 16, hex.join(" "), ascii);
    }
}

fn main() {
    let mut registry = Registry::new();
    registry.register::<Rc<RefCell<Doc>>>(
        "inspect.Doc",
        |e, x| {
            let doc = x.downcast_ref::<Rc<RefCell<Doc>>>().expect("registered for Doc");
            encode_doc(e, Some(doc));
        },
        |d| {
            let doc = decode_doc(d)?.ok_or(DecodeError::RefTypeMismatch { context: "Doc" })?;
            Ok(Box::new(doc))
        },
    );

    // Two documents that reference each other, plus a couple of scalars.
    let intro = Rc::new(RefCell::new(Doc {
        title: "Intro".to_owned(),
        related: None,
    }));
    let sequel = Rc::new(RefCell::new(Doc {
        title: "Sequel".to_owned(),
        related: Some(intro.clone()),
    }));
    intro.borrow_mut().related = Some(sequel.clone());

    let mut enc = Encoder::new(&registry);
    enc.encode_any(Some(&intro));
    enc.encode_any(Some(&42u64));
    enc.encode_any(Some(&String::from("done")));
    let bytes = enc.bytes();

    println!("stream: {} bytes", bytes.len());
    hex_dump(&bytes);

    let mut dec = Decoder::new(&registry, &bytes);
    let doc = *dec
        .decode()
        .expect("decode failed")
        .expect("first value is not nil")
        .downcast::<Rc<RefCell<Doc>>>()
        .expect("first value is a Doc");
    let answer = dec.decode().expect("decode failed").expect("second value is not nil");
    let farewell = dec.decode().expect("decode failed").expect("third value is not nil");

    println!();
    println!("decoded: {:?}", doc.borrow().title);
    let related = doc.borrow().related.clone().expect("related is present");
    println!("related: {:?}", related.borrow().title);
    let back = related.borrow().related.clone().expect("back-reference is present");
    println!(
        "cycle preserved: {}",
        Rc::ptr_eq(&back, &doc)
    );
    println!("answer: {}", answer.downcast::<u64>().expect("a u64"));
    println!("farewell: {:?}", farewell.downcast::<String>().expect("a string"));

    // Break the cycles so the Rcs can drop.
    intro.borrow_mut().related = None;
    doc.borrow_mut().related = None;
}
