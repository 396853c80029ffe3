use std::{
    fs::File,
    io::{self, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

/// JSON output destination: a file when a path is given, stdout otherwise.
#[derive(Debug)]
pub enum Output {
    Stdout(io::StdoutLock<'static>),
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = match output_path {
            Some(path) => {
                let file = File::create(&path).with_context(|| {
                    format!("failed to create output file: {}", path.display())
                })?;
                Output::File {
                    writer: BufWriter::new(file),
                    path,
                }
            }
            None => Output::Stdout(io::stdout().lock()),
        };

        serde_json::to_writer_pretty(&mut output, value)
            .with_context(|| format!("failed to write JSON to {}", output.display_path()))?;
        writeln!(&mut output)
            .and_then(|()| output.flush())
            .with_context(|| format!("failed to flush output to {}", output.display_path()))?;
        Ok(())
    }

    fn display_path(&self) -> String {
        match self {
            Output::Stdout(_) => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(writer) => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(writer) => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open {} file: {}", file_kind, path.display()))?;
    serde_json::from_reader(io::BufReader::new(file)).with_context(|| {
        format!(
            "failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })
}
