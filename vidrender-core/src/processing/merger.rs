//! Segment merger for the final output.
//!
//! Processed segments are concatenated strictly in the order given (index
//! order) with ffmpeg's concat demuxer. Video is stream-copied; when an audio
//! source is supplied its first audio track is re-encoded and muxed in,
//! trimmed to the video length.

use crate::config::MergeOptions;
use crate::error::{CoreError, CoreResult};
use crate::external::run_ffmpeg;
use ffmpeg_sidecar::command::FfmpegCommand;
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Joins processed segments into one playable file.
pub trait SegmentMerger: Send + Sync {
    /// `segments` are in index order; `audio_source` is the file whose audio
    /// should be kept, if any.
    fn merge(
        &self,
        segments: &[PathBuf],
        audio_source: Option<&Path>,
        output: &Path,
    ) -> CoreResult<PathBuf>;
}

/// Merger backed by ffmpeg's concat demuxer.
#[derive(Debug, Clone, Default)]
pub struct ConcatMerger {
    pub options: MergeOptions,
}

impl ConcatMerger {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }
}

impl SegmentMerger for ConcatMerger {
    fn merge(
        &self,
        segments: &[PathBuf],
        audio_source: Option<&Path>,
        output: &Path,
    ) -> CoreResult<PathBuf> {
        check_segments(segments)?;

        let output_dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&output_dir)?;

        // The demuxer resolves relative entries against the list's directory.
        let absolute = segments
            .iter()
            .map(fs::canonicalize)
            .collect::<Result<Vec<_>, _>>()?;

        // Concat list lives next to the output and is removed on drop.
        let mut list = NamedTempFile::new_in(&output_dir)?;
        list.write_all(concat_list(&absolute).as_bytes())?;
        list.flush()?;

        info!(
            "Merging {} segment(s) into {}{}",
            segments.len(),
            output.display(),
            if audio_source.is_some() { " with source audio" } else { "" }
        );

        let args = build_concat_args(list.path(), audio_source, output, &self.options);
        let mut cmd = FfmpegCommand::new();
        cmd.args(&args);
        run_ffmpeg(cmd, "ffmpeg (concat)").map_err(|e| CoreError::Merge(e.to_string()))?;

        let size = fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(CoreError::Merge(format!(
                "merged output {} is missing or empty",
                output.display()
            )));
        }
        debug!("Merged output is {} bytes", size);
        Ok(output.to_path_buf())
    }
}

/// Every segment must exist and be non-empty before ffmpeg sees the list.
pub fn check_segments(segments: &[PathBuf]) -> CoreResult<()> {
    if segments.is_empty() {
        return Err(CoreError::Merge("no segments to merge".to_string()));
    }
    for (index, path) in segments.iter().enumerate() {
        match fs::metadata(path) {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => {
                return Err(CoreError::Merge(format!(
                    "segment {} is empty: {}",
                    index,
                    path.display()
                )));
            }
            Err(_) => {
                return Err(CoreError::Merge(format!(
                    "segment {} is missing: {}",
                    index,
                    path.display()
                )));
            }
        }
    }
    Ok(())
}

/// Concat demuxer list, one `file '...'` line per segment.
pub fn concat_list(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

/// Arguments for the concat pass.
pub fn build_concat_args(
    list: &Path,
    audio_source: Option<&Path>,
    output: &Path,
    options: &MergeOptions,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list.to_string_lossy().into_owned(),
    ];

    if let Some(source) = audio_source {
        args.extend(["-i".into(), source.to_string_lossy().into_owned()]);
    }

    args.extend(["-map".into(), "0:v:0".into(), "-c:v".into(), "copy".into()]);

    if audio_source.is_some() {
        args.extend([
            "-map".into(),
            "1:a:0".into(),
            "-c:a".into(),
            options.audio_codec.clone(),
            "-shortest".into(),
        ]);
    } else {
        args.push("-an".into());
    }

    if options.faststart {
        args.extend(["-movflags".into(), "+faststart".into()]);
    }
    args.push(output.to_string_lossy().into_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_concat_args_without_audio() {
        let args = build_concat_args(
            Path::new("/tmp/list.txt"),
            None,
            Path::new("/tmp/out.mp4"),
            &MergeOptions::default(),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-f concat -safe 0 -i /tmp/list.txt"));
        assert!(joined.contains("-map 0:v:0 -c:v copy -an"));
        assert!(joined.contains("-movflags +faststart"));
        assert!(!joined.contains("1:a:0"));
    }

    #[test]
    fn test_build_concat_args_with_audio() {
        let args = build_concat_args(
            Path::new("/tmp/list.txt"),
            Some(Path::new("/up/source.mp4")),
            Path::new("/tmp/out.mp4"),
            &MergeOptions::default(),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-i /tmp/list.txt -i /up/source.mp4"));
        assert!(joined.contains("-map 1:a:0 -c:a aac -shortest"));
        assert!(!joined.contains("-an"));
    }

    #[test]
    fn configured_options_reach_the_concat_args() {
        let merger = ConcatMerger::new(MergeOptions {
            faststart: false,
            audio_codec: "libopus".to_string(),
        });
        let args = build_concat_args(
            Path::new("/tmp/list.txt"),
            Some(Path::new("/up/source.mp4")),
            Path::new("/tmp/out.mp4"),
            &merger.options,
        );
        let joined = args.join(" ");
        assert!(joined.contains("-c:a libopus"));
        assert!(!joined.contains("+faststart"));
    }

    #[test]
    fn concat_list_keeps_order_and_escapes_quotes() {
        let list = concat_list(&[
            PathBuf::from("/ws/seg_000.mp4"),
            PathBuf::from("/ws/it's_001.mp4"),
        ]);
        assert_eq!(
            list,
            "file '/ws/seg_000.mp4'\nfile '/ws/it'\\''s_001.mp4'\n"
        );
    }

    #[test]
    fn missing_or_empty_segments_are_merge_errors() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("a.mp4");
        let empty = dir.path().join("b.mp4");
        fs::write(&good, b"data").unwrap();
        fs::write(&empty, b"").unwrap();

        assert!(check_segments(&[good.clone()]).is_ok());
        assert!(matches!(check_segments(&[]), Err(CoreError::Merge(_))));
        let err = check_segments(&[good.clone(), empty]).unwrap_err();
        assert!(err.to_string().contains("segment 1 is empty"));
        let err = check_segments(&[good, dir.path().join("gone.mp4")]).unwrap_err();
        assert!(err.to_string().contains("segment 1 is missing"));
    }
}
