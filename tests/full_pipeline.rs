//! Full pipeline integration tests — source → tokens → checked AST → Story.

use sstc::dsl::compile::bucket;
use sstc::dsl::lexer::Lexer;
use sstc::dsl::parser::Parser;
use sstc::dsl::story::{ChoiceOption, Command};
use sstc::dsl::{Compiler, ErrorKind, Statement, Story};

/// Helper: compile with default settings.
fn compile(src: &str) -> Story {
    Compiler::new().compile(src).expect("compile failed")
}

fn error_kind(src: &str) -> (ErrorKind, String) {
    match Compiler::new().compile(src) {
        Ok(story) => panic!("expected failure, got {story:?}"),
        Err(e) => (e.kind, e.message),
    }
}

const SCENARIO: &str = r#"
background room("room.png")
define ana "Ana" { happy: ("ana_happy.png", scale: 1.1) }
label start:
  scene room
  show ana happy
  ana "Hello!" (speed: 20)
  end
"#;

#[test]
fn end_to_end_scenario() {
    let story = compile(SCENARIO);

    assert_eq!(story.assets.backgrounds.len(), 1);
    assert_eq!(story.assets.backgrounds["room"], "room.png");
    assert_eq!(story.assets.characters.len(), 1);
    let ana = &story.assets.characters["ana"];
    assert_eq!(ana.name, "Ana");
    assert_eq!(ana.states.len(), 1);
    assert!(ana.states.contains_key("happy"));
    assert!(story.assets.music.is_empty());

    assert_eq!(story.script.len(), 1);
    let start = story.block("start").expect("start block");
    let names: Vec<&str> = start.commands.iter().map(Command::name).collect();
    assert_eq!(names, vec!["scene", "show", "dialogue", "end"]);
    assert_eq!(
        start.commands[2],
        Command::Dialogue {
            speaker: "ana".to_string(),
            text: "Hello!".to_string(),
            speed: 20.0,
            size: None,
        }
    );
}

#[test]
fn mode_scale_is_uniform() {
    let story = compile(SCENARIO);
    let scale = story.assets.characters["ana"].states["happy"]
        .scale
        .expect("scale");
    assert_approx_eq::assert_approx_eq!(scale[0], 1.1);
    assert_approx_eq::assert_approx_eq!(scale[1], 1.1);
}

#[test]
fn buckets_reproduce_top_level_statements_in_order() {
    let src = r#"
background a("a.png")
music m "m.ogg"
"Prologue"
define c "C" { idle: ("c.png") }
play m
label one:
  scene a
label two:
  stop m
"#;
    let checked = Compiler::new().parse(src).unwrap();
    let buckets = bucket(&checked.program);

    let mut merged: Vec<&Statement> = Vec::new();
    merged.extend(buckets.declarations.iter().copied());
    merged.extend(buckets.script.iter().copied());
    assert_eq!(merged.len(), checked.program.statements.len());
    for statement in &checked.program.statements {
        assert_eq!(
            merged.iter().filter(|s| std::ptr::eq(**s, statement)).count(),
            1
        );
    }

    let declared: Vec<&Statement> = checked
        .program
        .statements
        .iter()
        .filter(|s| s.is_declaration())
        .collect();
    assert_eq!(buckets.declarations, declared);
}

#[test]
fn label_index_matches_declaration_order() {
    let src = r#"
"Intro"
label first:
  "one"
  "two"
label second:
label third:
  end
"#;
    let story = compile(src);
    assert_eq!(
        story.label_index(),
        vec![("first", 1), ("second", 3), ("third", 3)]
    );
    let commands: Vec<&Command> = story.commands().collect();
    assert_eq!(commands.len(), 4);
    assert_eq!(commands[3], &Command::End);
}

#[test]
fn branching_story() {
    let src = r#"
background hall("hall.png")
music theme "theme.ogg"
define ana "Ana" { calm: ("calm.png"), angry: ("angry.png") }

label start:
  scene hall
  play theme
  show ana calm (x: 0.5, y: 1)
  "Which door?"
  choice "Pick one"
    option "Left" -> left
    option "Right" -> right

label left:
  show ana angry
  ana "Wrong door." (size: 28)
  jump start

label right:
  stop theme
  hide ana
  end
"#;
    let story = compile(src);
    assert_eq!(story.script.len(), 3);

    let start = &story.script[0].commands;
    assert_eq!(
        start[2],
        Command::Show {
            character: "ana".to_string(),
            state: "calm".to_string(),
            position: Some([0.5, 1.0]),
            scale: None,
        }
    );
    assert_eq!(
        start[4],
        Command::Choice {
            prompt: "Pick one".to_string(),
            options: vec![
                ChoiceOption {
                    text: "Left".to_string(),
                    goto: "left".to_string(),
                },
                ChoiceOption {
                    text: "Right".to_string(),
                    goto: "right".to_string(),
                },
            ],
        }
    );

    // Every target exists in the artifact.
    let labels: Vec<&str> = story.label_index().into_iter().map(|(l, _)| l).collect();
    for command in story.commands() {
        for target in command.targets() {
            assert!(labels.contains(&target), "missing {target}");
        }
    }
}

#[test]
fn unresolved_jump_names_target() {
    let (kind, message) = error_kind("jump nowhere");
    assert_eq!(kind, ErrorKind::Unresolved);
    assert!(message.contains("nowhere"));
}

#[test]
fn unresolved_option_names_target() {
    let (kind, message) = error_kind("label a:\nchoice \"?\"\n option \"x\" -> ghost");
    assert_eq!(kind, ErrorKind::Unresolved);
    assert!(message.contains("ghost"));
}

#[test]
fn duplicate_definitions_fail_at_second_declaration() {
    let err = Compiler::new()
        .compile("music m \"a.ogg\"\n\nmusic m \"b.ogg\"")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.line, 3);
    assert!(err.message.contains("already defined"));
}

#[test]
fn undefined_mode_and_character() {
    let base = "define ana \"Ana\" { happy: (\"a.png\") }\n";

    let (kind, message) = error_kind(&format!("{base}show ana sad"));
    assert_eq!(kind, ErrorKind::Semantic);
    assert!(message.contains("undefined mode 'sad'"));

    let (_, message) = error_kind(&format!("{base}show bob happy"));
    assert!(message.contains("undefined character 'bob'"));

    let (_, message) = error_kind(&format!("{base}hide bob"));
    assert!(message.contains("undefined character 'bob'"));
}

#[test]
fn parameter_typing() {
    let (kind, message) = error_kind(r#"background bg("img.png", x: 10, y: "oops")"#);
    assert_eq!(kind, ErrorKind::Semantic);
    assert!(message.contains("'y'"));

    let (kind, message) = error_kind(r#"background bg("img.png", color: 1)"#);
    assert_eq!(kind, ErrorKind::Semantic);
    assert!(message.contains("'color'"));
}

#[test]
fn deferred_check_is_a_separate_step() {
    let output = Parser::new(Lexer::from_source("jump later\njump never\nlabel later:"))
        .parse()
        .unwrap();
    let pending: Vec<&str> = output.unresolved().map(|r| r.name.as_str()).collect();
    assert_eq!(pending, vec!["never"]);
    let err = output.finish().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unresolved);
    assert_eq!(err.line, 2);
}

#[test]
fn read_failure_is_reported_as_io() {
    struct Broken(bool);
    impl std::io::Read for Broken {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
            }
            self.0 = true;
            let src = b"label start:\n  \"unfinished";
            buf[..src.len()].copy_from_slice(src);
            Ok(src.len())
        }
    }

    let err = Compiler::new().compile_reader(Broken(false)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
    assert!(err.message.contains("disk gone"));
}

#[test]
fn compile_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("story.sst");
    std::fs::write(&path, SCENARIO).unwrap();
    let story = Compiler::new().compile_file(&path).unwrap();
    assert_eq!(story, compile(SCENARIO));
}
