use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct VisionEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> VisionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting frame analysis...");
        self.monitor.log_stats("Start", 0);

        tracing::info!("Extracting frames...");
        let frames = self.pipeline.extract().await?;
        tracing::info!("Extracted {} frames", frames.len());
        self.monitor.log_stats("Extract", frames.len());

        tracing::info!("Analysing frames...");
        let result = self.pipeline.transform(frames).await?;
        let stops = result.reports.iter().filter(|r| r.stop_detected).count();
        let lines = result.reports.iter().filter(|r| r.white_detected).count();
        tracing::info!(
            "Analysed {} frames ({} with stop line, {} with white line)",
            result.reports.len(),
            stops,
            lines
        );
        let frame_count = result.reports.len();
        self.monitor.log_stats("Transform", frame_count);

        tracing::info!("Writing outputs...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load", frame_count);
        self.monitor.log_final_stats(frame_count);

        Ok(output_path)
    }
}
