use highvocab_types::Point;

use crate::page::{PageCommand, document_from_text};

#[test]
fn test_parse_commands() {
    assert_eq!("hover 12 8".parse::<PageCommand>().unwrap(), PageCommand::Hover(Point::new(12.0, 8.0)));
    assert_eq!(
        "select 1 2 3.5 4".parse::<PageCommand>().unwrap(),
        PageCommand::Select(Point::new(1.0, 2.0), Point::new(3.5, 4.0))
    );
    assert_eq!("scroll".parse::<PageCommand>().unwrap(), PageCommand::Scroll(100.0));
    assert_eq!("scroll -20".parse::<PageCommand>().unwrap(), PageCommand::Scroll(-20.0));
    assert_eq!(
        "append a new  line".parse::<PageCommand>().unwrap(),
        PageCommand::Append("a new  line".into())
    );
    assert_eq!("  save ".parse::<PageCommand>().unwrap(), PageCommand::Save);
    assert_eq!("quit".parse::<PageCommand>().unwrap(), PageCommand::Quit);
}

#[test]
fn test_reject_bad_commands() {
    assert!("hover 1".parse::<PageCommand>().is_err());
    assert!("hover x y".parse::<PageCommand>().is_err());
    assert!("append".parse::<PageCommand>().is_err());
    assert!("dance".parse::<PageCommand>().is_err());
}

#[test]
fn test_document_from_text_skips_blank_lines() {
    let doc = document_from_text("first line\n\n   \nsecond line\n").unwrap();

    let paragraphs = doc.children(doc.body());
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(doc.text_content(paragraphs[1]), "second line");
}
