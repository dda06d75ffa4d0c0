// Text format for chord progressions. One line per bar:
//
//     4/4 C-major-2 G-dominant7-2
//     3/4 A-minor-3
//
// The leading fraction is the time signature; each following token is
// root-quality-beats, where beats counts units of 1/denominator. Blank
// lines and lines starting with '#' are skipped. Chord beat counts must
// sum to the signature numerator; this is the only place that checks,
// so everything downstream can assume well-formed bars.

use crate::bar::{Bar, TimeSignature};
use crate::chord::{Chord, ChordType, NoteName};
use crate::duration::Duration;
use std::path::Path;

pub fn parse_progression(text: &str) -> Result<Vec<Bar>, Box<dyn std::error::Error>> {
    let mut bars = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        bars.push(parse_bar(line).map_err(|e| format!("line {line_no}: {e}"))?);
    }
    if bars.is_empty() {
        return Err("progression contains no bars".into());
    }
    Ok(bars)
}

pub fn load_progression(path: &Path) -> Result<Vec<Bar>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    parse_progression(&text)
}

fn parse_bar(line: &str) -> Result<Bar, String> {
    let mut tokens = line.split_whitespace();
    let signature = tokens
        .next()
        .ok_or_else(|| "missing time signature".to_string())?;
    let (num, den) = signature
        .split_once('/')
        .ok_or_else(|| format!("time signature '{signature}' is not numerator/denominator"))?;
    let numerator: u8 = num
        .parse()
        .map_err(|_| format!("bad signature numerator '{num}'"))?;
    let denominator: u8 = den
        .parse()
        .map_err(|_| format!("bad signature denominator '{den}'"))?;
    if numerator == 0 || denominator == 0 {
        return Err(format!("time signature {numerator}/{denominator} has a zero component"));
    }
    let ts = TimeSignature::new(numerator, denominator);

    let mut chords = Vec::new();
    let mut beats_seen: u32 = 0;
    for token in tokens {
        let (root, kind, beats) = parse_chord_token(token)?;
        beats_seen += beats as u32;
        chords.push(Chord::new(root, kind, Duration::new(beats, denominator)));
    }
    if chords.is_empty() {
        return Err("bar has no chords".to_string());
    }
    if beats_seen != numerator as u32 {
        return Err(format!(
            "chord beats sum to {beats_seen}, time signature {numerator}/{denominator} \
             needs {numerator}"
        ));
    }
    Ok(Bar::new(ts, chords))
}

fn parse_chord_token(token: &str) -> Result<(NoteName, ChordType, u8), String> {
    let mut parts = token.split('-');
    let (Some(root), Some(kind), Some(beats), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("chord '{token}' is not root-quality-beats"));
    };
    let root: NoteName = root.parse()?;
    let kind: ChordType = kind.parse()?;
    let beats: u8 = beats
        .parse()
        .map_err(|_| format!("bad beat count '{beats}' in chord '{token}'"))?;
    if beats == 0 {
        return Err(format!("chord '{token}' has a zero beat count"));
    }
    Ok((root, kind, beats))
}
