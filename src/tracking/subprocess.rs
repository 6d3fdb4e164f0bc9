//! Hand landmark detection delegated to a helper process.
//!
//! The helper signals `READY` on stdout, then for every frame reads a
//! 12-byte header (`width`, `height`, `channels` as little-endian u32)
//! followed by raw RGB bytes, and answers with one JSON line:
//!
//! ```text
//! {"hands":[{"handedness":"Right","score":0.93,"landmarks":[{"x":..,"y":..,"z":..}]}]}
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::Instant;

use crate::camera::Frame;

use super::{Handedness, HandObservation, Landmark, LandmarkDetector, LANDMARK_COUNT};

const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f64,
    y: f64,
    #[serde(default)]
    z: f64,
    #[serde(default = "full_visibility")]
    visibility: f64,
}

fn full_visibility() -> f64 {
    1.0
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f64,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionResult {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

pub struct SubprocessDetector {
    process: Child,
    stdout_reader: BufReader<ChildStdout>,
    confidence_threshold: f64,
    clock: Instant,
}

impl SubprocessDetector {
    /// Starts `program args..` and waits for its `READY` line.
    pub fn spawn(command: &[String]) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("detector command is empty");
        };

        log::info!("Starting landmark detector subprocess: {}", command.join(" "));

        let mut process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start detector `{program}`"))?;

        let stdout = process
            .stdout
            .take()
            .context("detector stdout unavailable")?;
        let mut stdout_reader = BufReader::new(stdout);

        let mut ready_line = String::new();
        stdout_reader
            .read_line(&mut ready_line)
            .context("failed to read detector ready line")?;
        if ready_line.trim() != "READY" {
            let _ = process.kill();
            bail!("detector did not signal ready, got: {:?}", ready_line.trim());
        }

        log::info!("Landmark detector ready");

        Ok(Self {
            process,
            stdout_reader,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            clock: Instant::now(),
        })
    }
}

impl LandmarkDetector for SubprocessDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<HandObservation>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let stdin = self
            .process
            .stdin
            .as_mut()
            .context("detector stdin unavailable")?;
        stdin.write_all(&width.to_le_bytes())?;
        stdin.write_all(&height.to_le_bytes())?;
        stdin.write_all(&3u32.to_le_bytes())?;
        stdin.write_all(frame.as_raw())?;
        stdin.flush()?;

        let mut response = String::new();
        let read = self
            .stdout_reader
            .read_line(&mut response)
            .context("failed to read detector response")?;
        if read == 0 {
            bail!("detector process closed its output");
        }

        let timestamp = self.clock.elapsed().as_secs_f64();
        parse_detection(&response, (width, height), timestamp, self.confidence_threshold)
    }

    fn close(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

impl Drop for SubprocessDetector {
    fn drop(&mut self) {
        let _ = self.process.kill();
    }
}

/// Picks the first sufficiently confident hand out of a detector response line.
fn parse_detection(
    line: &str,
    frame_size: (u32, u32),
    timestamp: f64,
    confidence_threshold: f64,
) -> Result<Option<HandObservation>> {
    let result: DetectionResult = serde_json::from_str(line.trim())
        .with_context(|| format!("failed to parse detector response: {}", line.trim()))?;

    if let Some(error) = result.error {
        log::warn!("detector reported error: {error}");
        return Ok(None);
    }

    let Some(hand) = result
        .hands
        .into_iter()
        .find(|hand| hand.score >= confidence_threshold)
    else {
        return Ok(None);
    };

    if hand.landmarks.len() != LANDMARK_COUNT {
        log::warn!(
            "expected {} landmarks, got {}",
            LANDMARK_COUNT,
            hand.landmarks.len()
        );
    }

    let landmarks: Vec<Landmark> = hand
        .landmarks
        .into_iter()
        .map(|lm| Landmark {
            x: lm.x,
            y: lm.y,
            z: lm.z,
            visibility: lm.visibility,
        })
        .collect();

    let observation = HandObservation {
        frame_size,
        handedness: Handedness::from_label(&hand.handedness),
        landmarks,
        timestamp,
    };

    log::debug!(
        "Detected {:?} hand with {} landmarks (score={:.2})",
        observation.handedness,
        observation.landmarks.len(),
        hand.score
    );

    Ok(Some(observation))
}
