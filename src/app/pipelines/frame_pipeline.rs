use crate::adapters::frames::{color_bars, decode_frame};
use crate::adapters::preview::{encode_png, side_by_side};
use crate::core::detect::{analyze_frame, DetectionOptions};
use crate::core::{
    AnalysisResult, ConfigProvider, Frame, FramePreview, FrameReport, Pipeline, Storage,
};
use crate::domain::model::RunSummary;
use crate::utils::error::{Result, VisionError};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

pub const ARCHIVE_NAME: &str = "microcv_output.zip";

/// Reads frame dumps from `source`, writes reports and previews to `sink`.
pub struct FramePipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> FramePipeline<S, C> {
    pub fn new(source: S, sink: S, config: C) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn build_csv(reports: &[FrameReport]) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for report in reports {
            writer.serialize(report)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| VisionError::ProcessingError {
                message: format!("CSV buffer error: {}", e),
            })?;
        String::from_utf8(bytes).map_err(|e| VisionError::ProcessingError {
            message: format!("CSV output is not UTF-8: {}", e),
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for FramePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Frame>> {
        let (width, height) = self.config.frame_size();
        let format = self.config.frame_format();

        tracing::debug!(
            "Listing {:?} files in {}",
            self.config.extensions(),
            self.config.input_dir()
        );
        let files = self.source.list_files("", self.config.extensions()).await?;

        if files.is_empty() {
            if self.config.test_pattern() {
                tracing::warn!("No frame dumps found, analysing a colour-bar test pattern");
                return Ok(vec![color_bars(width, height)]);
            }
            return Err(VisionError::InvalidConfigValueError {
                field: "input_dir".to_string(),
                value: self.config.input_dir().to_string(),
                reason: format!(
                    "No files with extensions {} found",
                    self.config.extensions().join(", ")
                ),
            });
        }

        let mut frames = Vec::with_capacity(files.len());
        for file in &files {
            let bytes = self.source.read_file(file).await?;
            let frame = decode_frame(file, &bytes, format, width, height)?;
            tracing::debug!("Decoded {} ({} bytes)", file, bytes.len());
            frames.push(frame);
        }

        Ok(frames)
    }

    async fn transform(&self, frames: Vec<Frame>) -> Result<AnalysisResult> {
        let params = self.config.vision_params();
        let options = DetectionOptions {
            obstacles: self.config.obstacle_detection(),
        };

        let mut reports = Vec::with_capacity(frames.len());
        let mut previews = Vec::with_capacity(frames.len());

        for frame in &frames {
            let analysis = analyze_frame(frame, params, options)?;
            reports.push(analysis.report);
            previews.push(FramePreview {
                name: frame.name.clone(),
                original: analysis.original,
                overlay: analysis.overlay,
            });
        }

        let csv_output = Self::build_csv(&reports)?;

        Ok(AnalysisResult {
            reports,
            csv_output,
            previews,
        })
    }

    async fn load(&self, result: AnalysisResult) -> Result<String> {
        let output_path = format!("{}/{}", self.config.output_path(), ARCHIVE_NAME);
        let scale = self.config.preview_scale();

        let summary = RunSummary::from_reports(result.reports);
        let json_output = serde_json::to_string_pretty(&summary)?;

        let mut previews = Vec::with_capacity(result.previews.len());
        for preview in &result.previews {
            let combined = side_by_side(&preview.original, &preview.overlay, scale)?;
            previews.push((format!("previews/{}.png", preview.name), encode_png(&combined)?));
        }

        self.sink.write_file("report.csv", result.csv_output.as_bytes()).await?;
        self.sink.write_file("report.json", json_output.as_bytes()).await?;
        for (name, png) in &previews {
            self.sink.write_file(name, png).await?;
        }

        if self.config.save_frames() {
            for preview in &result.previews {
                let png = encode_png(&preview.original)?;
                self.sink
                    .write_file(&format!("frames/{}.png", preview.name), &png)
                    .await?;
            }
            tracing::debug!("Saved {} decoded frames", result.previews.len());
        }

        tracing::debug!("Creating ZIP file with {} files", 2 + previews.len());

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("report.csv", FileOptions::default())?;
            zip.write_all(result.csv_output.as_bytes())?;

            zip.start_file::<_, ()>("report.json", FileOptions::default())?;
            zip.write_all(json_output.as_bytes())?;

            // PNG data is already compressed
            let stored: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, png) in &previews {
                zip.start_file(name.as_str(), stored)?;
                zip.write_all(png)?;
            }

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.sink.write_file(ARCHIVE_NAME, &zip_data).await?;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::frames::{encode_compact_hex, FrameFormat};
    use crate::core::params::VisionParams;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn list_files(&self, _dir: &str, extensions: &[String]) -> Result<Vec<String>> {
            let files = self.files.lock().await;
            let mut names: Vec<String> = files
                .keys()
                .filter(|name| crate::adapters::frames::has_extension(name, extensions))
                .cloned()
                .collect();
            names.sort();
            Ok(names)
        }

        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                VisionError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct TestConfig {
        extensions: Vec<String>,
        vision: VisionParams,
        test_pattern: bool,
        save_frames: bool,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                extensions: vec![".bin".to_string()],
                vision: VisionParams::default(),
                test_pattern: false,
                save_frames: false,
            }
        }
    }

    impl ConfigProvider for TestConfig {
        fn input_dir(&self) -> &str {
            "memory"
        }
        fn output_path(&self) -> &str {
            "./out"
        }
        fn extensions(&self) -> &[String] {
            &self.extensions
        }
        fn frame_format(&self) -> FrameFormat {
            FrameFormat::Auto
        }
        fn frame_size(&self) -> (u32, u32) {
            (96, 96)
        }
        fn vision_params(&self) -> &VisionParams {
            &self.vision
        }
        fn obstacle_detection(&self) -> bool {
            false
        }
        fn save_frames(&self) -> bool {
            self.save_frames
        }
        fn test_pattern(&self) -> bool {
            self.test_pattern
        }
        fn preview_scale(&self) -> u32 {
            1
        }
    }

    fn red_frame(name: &str) -> Frame {
        Frame::filled(name, 96, 96, 0xF800)
    }

    #[tokio::test]
    async fn test_extract_decodes_matching_files_in_order() {
        let source = MockStorage::default();
        source.put("b.bin", encode_compact_hex(&red_frame("b.bin")).as_bytes()).await;
        source.put("a.bin", encode_compact_hex(&Frame::filled("a.bin", 96, 96, 0)).as_bytes()).await;
        source.put("notes.md", b"ignored").await;

        let pipeline = FramePipeline::new(source, MockStorage::default(), TestConfig::default());
        let frames = pipeline.extract().await.unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].name, "a.bin");
        assert_eq!(frames[1].pixel(10, 10), 0xF800);
    }

    #[tokio::test]
    async fn test_extract_fails_on_corrupt_frame() {
        let source = MockStorage::default();
        source.put("short.bin", b"00F8").await;

        let pipeline = FramePipeline::new(source, MockStorage::default(), TestConfig::default());
        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, VisionError::FrameDecodeError { .. }));
    }

    #[tokio::test]
    async fn test_extract_empty_input() {
        let pipeline = FramePipeline::new(
            MockStorage::default(),
            MockStorage::default(),
            TestConfig::default(),
        );
        assert!(pipeline.extract().await.is_err());

        let config = TestConfig {
            test_pattern: true,
            ..TestConfig::default()
        };
        let pipeline = FramePipeline::new(MockStorage::default(), MockStorage::default(), config);
        let frames = pipeline.extract().await.unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].name, "color_bars");
    }

    #[tokio::test]
    async fn test_transform_builds_reports_and_csv() {
        let pipeline = FramePipeline::new(
            MockStorage::default(),
            MockStorage::default(),
            TestConfig::default(),
        );
        let result = pipeline
            .transform(vec![red_frame("red.bin"), Frame::filled("dark.bin", 96, 96, 0)])
            .await
            .unwrap();

        assert_eq!(result.reports.len(), 2);
        assert!(result.reports[0].stop_detected);
        assert!(!result.reports[1].stop_detected);
        assert_eq!(result.previews.len(), 2);

        let mut lines = result.csv_output.lines();
        assert!(lines.next().unwrap().starts_with("frame,stop_detected,stop_pixels"));
        assert!(lines.next().unwrap().starts_with("red.bin,true,286,10000"));
    }

    #[tokio::test]
    async fn test_load_writes_reports_previews_and_archive() {
        let sink = MockStorage::default();
        let config = TestConfig {
            save_frames: true,
            ..TestConfig::default()
        };
        let pipeline = FramePipeline::new(MockStorage::default(), sink.clone(), config);

        let result = pipeline.transform(vec![red_frame("red.bin")]).await.unwrap();
        let path = pipeline.load(result).await.unwrap();

        assert_eq!(path, "./out/microcv_output.zip");
        assert!(sink.get_file("report.csv").await.is_some());
        assert!(sink.get_file("previews/red.bin.png").await.is_some());
        assert!(sink.get_file("frames/red.bin.png").await.is_some());

        let json = sink.get_file("report.json").await.unwrap();
        let summary: RunSummary = serde_json::from_slice(&json).unwrap();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.stop_frames, 1);

        let archive = sink.get_file(ARCHIVE_NAME).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        assert_eq!(archive.len(), 3);
        assert!(archive.by_name("previews/red.bin.png").is_ok());
    }
}
