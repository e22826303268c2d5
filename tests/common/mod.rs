#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use camino::Utf8PathBuf;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use airline_logos::domain::Airline;
use airline_logos::fetch::Sleeper;
use airline_logos::http::{HttpResponse, LogoClient, TransportError};
use airline_logos::progress::{ProgressReporter, ProgressState};

pub type Scripted = Result<HttpResponse, TransportError>;

/// Serves scripted responses per URL. The last scripted response for a URL
/// repeats; unknown URLs answer 404.
#[derive(Default)]
pub struct MockClient {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<HashMap<String, usize>>,
    panic_on: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn respond(&self, url: &str, status: u16, body: Vec<u8>) {
        self.script(url, Ok(HttpResponse { status, body }));
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.script(url, Err(TransportError(reason.to_string())));
    }

    pub fn script(&self, url: &str, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn panic_on(&self, url: &str) {
        self.panic_on.lock().unwrap().push(url.to_string());
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl LogoClient for MockClient {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        if self.panic_on.lock().unwrap().iter().any(|target| target == url) {
            panic!("mock transport exploded on {url}");
        }

        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(HttpResponse {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn seconds(&self) -> Vec<f64> {
        self.sleeps
            .lock()
            .unwrap()
            .iter()
            .map(Duration::as_secs_f64)
            .collect()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub logs: Mutex<Vec<String>>,
    pub redraws: Mutex<Vec<usize>>,
    pub finished: Mutex<bool>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn log(&self, message: &str, _state: &ProgressState) {
        self.logs.lock().unwrap().push(message.to_string());
    }

    fn redraw(&self, state: &ProgressState) {
        self.redraws.lock().unwrap().push(state.completed);
    }

    fn finish(&self, _state: &ProgressState) {
        *self.finished.lock().unwrap() = true;
    }
}

pub fn airline(icao: &str) -> Airline {
    Airline::from_codes(None, icao).unwrap()
}

/// A non-uniform RGBA image.
pub fn logo_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255])
    }))
}

pub fn solid_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}
