// Integration tests for voice answers
//
// A scripted host replays recognition events through the real controller and
// the answer draft, the way a practice command uses them.

use anyhow::Result;
use lingo_practice::speech::{
    RecognitionEvent, RecognitionResult, ScriptStep, ScriptedHost, SpeechConfig,
};
use lingo_practice::{capture_voice_answer, SpeechHost};
use std::io::Write;
use tempfile::NamedTempFile;

fn result_step(delay_ms: u64, result_index: usize, results: Vec<RecognitionResult>) -> ScriptStep {
    ScriptStep {
        delay_ms,
        event: RecognitionEvent::Result {
            result_index,
            results,
        },
    }
}

fn quick_config() -> SpeechConfig {
    SpeechConfig {
        restart_delay_ms: 1,
        max_listen_secs: 5,
        ..SpeechConfig::default()
    }
}

#[tokio::test]
async fn test_voice_answer_collects_final_text_only() -> Result<()> {
    let host = ScriptedHost::new(vec![
        ScriptStep {
            delay_ms: 0,
            event: RecognitionEvent::SpeechStart,
        },
        result_step(5, 0, vec![RecognitionResult::interim_text("I am")]),
        result_step(5, 0, vec![RecognitionResult::final_text("I am a student.")]),
        result_step(
            5,
            1,
            vec![
                RecognitionResult::final_text("I am a student."),
                RecognitionResult::interim_text("Nice"),
            ],
        ),
        result_step(
            5,
            1,
            vec![
                RecognitionResult::final_text("I am a student."),
                RecognitionResult::final_text("Nice to meet you."),
            ],
        ),
    ]);

    let answer = capture_voice_answer(&host, quick_config()).await?;

    assert_eq!(answer.as_deref(), Some("I am a student. Nice to meet you."));
    Ok(())
}

#[tokio::test]
async fn test_voice_answer_stops_after_first_utterance_when_not_continuous() -> Result<()> {
    let host = ScriptedHost::new(vec![
        result_step(0, 0, vec![RecognitionResult::final_text("first")]),
        result_step(0, 1, vec![
            RecognitionResult::final_text("first"),
            RecognitionResult::final_text("second"),
        ]),
    ]);
    let config = SpeechConfig {
        continuous: false,
        ..quick_config()
    };

    let answer = capture_voice_answer(&host, config).await?;

    assert_eq!(answer.as_deref(), Some("first"));
    Ok(())
}

#[tokio::test]
async fn test_permission_denied_yields_no_answer() -> Result<()> {
    let host = ScriptedHost::new(vec![ScriptStep {
        delay_ms: 0,
        event: RecognitionEvent::Error {
            error: "not-allowed".to_string(),
            message: "Permission denied".to_string(),
        },
    }]);

    let answer = capture_voice_answer(&host, quick_config()).await?;

    assert_eq!(answer, None);
    Ok(())
}

#[tokio::test]
async fn test_listen_limit_stops_capture() -> Result<()> {
    let host = ScriptedHost::new(vec![
        result_step(0, 0, vec![RecognitionResult::final_text("quick")]),
        result_step(60_000, 1, vec![RecognitionResult::final_text("never")]),
    ]);
    let config = SpeechConfig {
        max_listen_secs: 1,
        ..quick_config()
    };

    let answer = capture_voice_answer(&host, config).await?;

    assert_eq!(answer.as_deref(), Some("quick"));
    Ok(())
}

#[tokio::test]
async fn test_unsupported_host_is_an_error() {
    let host = lingo_practice::speech::NoSpeechHost;
    assert!(capture_voice_answer(&host as &dyn SpeechHost, quick_config())
        .await
        .is_err());
}

#[tokio::test]
async fn test_script_file_round_trip() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "# recorded in a quiet room")?;
    writeln!(
        file,
        r#"{{"delay_ms": 1, "event": {{"type": "result", "result_index": 0, "results": [{{"is_final": true, "alternatives": [{{"transcript": "See you tomorrow.", "confidence": 0.92}}]}}]}}}}"#
    )?;
    file.flush()?;

    let host = ScriptedHost::from_file(file.path())?;
    assert_eq!(host.steps().len(), 1);

    let answer = capture_voice_answer(&host, quick_config()).await?;
    assert_eq!(answer.as_deref(), Some("See you tomorrow."));
    Ok(())
}
