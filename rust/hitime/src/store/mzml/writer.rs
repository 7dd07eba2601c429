use super::binary::encode_array;
use super::cv;
use crate::errors::{
    DataProcessingError,
    DataReadingError,
    Result,
};
use crate::models::Spectrum;
use crate::store::SpectrumSink;
use quick_xml::events::{
    BytesDecl,
    BytesEnd,
    BytesStart,
    BytesText,
    Event,
};
use quick_xml::Writer;
use std::fs::File;
use std::io::{
    BufWriter,
    Write,
};
use std::path::Path;

const MZML_NAMESPACE: &str = "http://psi.hupo.org/ms/mzml";
const SOFTWARE_ID: &str = "hitime";
const PROCESSING_ID: &str = "hitime_scoring";

/// Streams scored spectra into a minimal mzML document.
///
/// The header is written on construction and each spectrum is written as it
/// is consumed, so nothing but the current spectrum is held in memory. Arrays
/// are stored as little endian 64-bit floats.
pub struct MzMLWriter<W: Write> {
    writer: Writer<W>,
    expected: usize,
    written: usize,
    compress: bool,
}

impl MzMLWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>, num_spectra: usize, compress: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| DataReadingError::Io {
            source,
            path: Some(path.to_path_buf()),
        })?;
        Self::new(BufWriter::new(file), num_spectra, compress)
    }
}

impl<W: Write> MzMLWriter<W> {
    pub fn new(inner: W, num_spectra: usize, compress: bool) -> Result<Self> {
        let mut out = Self {
            writer: Writer::new_with_indent(inner, b' ', 2),
            expected: num_spectra,
            written: 0,
            compress,
        };
        out.write_header()?;
        Ok(out)
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn start(&mut self, tag: BytesStart) -> std::result::Result<(), DataReadingError> {
        self.writer.write_event(Event::Start(tag))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> std::result::Result<(), DataReadingError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, tag: BytesStart) -> std::result::Result<(), DataReadingError> {
        self.writer.write_event(Event::Empty(tag))?;
        Ok(())
    }

    fn cv_param(
        &mut self,
        accession: &str,
        name: &str,
        value: &str,
    ) -> std::result::Result<(), DataReadingError> {
        self.empty(BytesStart::new("cvParam").with_attributes([
            ("cvRef", "MS"),
            ("accession", accession),
            ("name", name),
            ("value", value),
        ]))
    }

    fn write_header(&mut self) -> std::result::Result<(), DataReadingError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.start(
            BytesStart::new("mzML")
                .with_attributes([("xmlns", MZML_NAMESPACE), ("version", "1.1.0")]),
        )?;

        self.start(BytesStart::new("cvList").with_attributes([("count", "2")]))?;
        self.empty(BytesStart::new("cv").with_attributes([
            ("id", "MS"),
            (
                "fullName",
                "Proteomics Standards Initiative Mass Spectrometry Ontology",
            ),
            (
                "URI",
                "https://raw.githubusercontent.com/HUPO-PSI/psi-ms-CV/master/psi-ms.obo",
            ),
        ]))?;
        self.empty(BytesStart::new("cv").with_attributes([
            ("id", "UO"),
            ("fullName", "Unit Ontology"),
            (
                "URI",
                "https://raw.githubusercontent.com/bio-ontology-research-group/unit-ontology/master/unit.obo",
            ),
        ]))?;
        self.end("cvList")?;

        self.start(BytesStart::new("fileDescription"))?;
        self.start(BytesStart::new("fileContent"))?;
        self.cv_param(cv::MS1_SPECTRUM, "MS1 spectrum", "")?;
        self.end("fileContent")?;
        self.end("fileDescription")?;

        let version = env!("CARGO_PKG_VERSION");
        self.start(BytesStart::new("softwareList").with_attributes([("count", "1")]))?;
        self.empty(
            BytesStart::new("software").with_attributes([("id", SOFTWARE_ID), ("version", version)]),
        )?;
        self.end("softwareList")?;

        self.start(
            BytesStart::new("instrumentConfigurationList").with_attributes([("count", "1")]),
        )?;
        self.empty(BytesStart::new("instrumentConfiguration").with_attributes([("id", "IC1")]))?;
        self.end("instrumentConfigurationList")?;

        self.start(BytesStart::new("dataProcessingList").with_attributes([("count", "1")]))?;
        self.start(BytesStart::new("dataProcessing").with_attributes([("id", PROCESSING_ID)]))?;
        self.empty(
            BytesStart::new("processingMethod")
                .with_attributes([("order", "0"), ("softwareRef", SOFTWARE_ID)]),
        )?;
        self.end("dataProcessing")?;
        self.end("dataProcessingList")?;

        self.start(BytesStart::new("run").with_attributes([
            ("id", "hitime_scores"),
            ("defaultInstrumentConfigurationRef", "IC1"),
        ]))?;
        let count = self.expected.to_string();
        self.start(BytesStart::new("spectrumList").with_attributes([
            ("count", count.as_str()),
            ("defaultDataProcessingRef", PROCESSING_ID),
        ]))?;
        Ok(())
    }

    fn write_array(
        &mut self,
        values: &[f64],
        accession: &str,
        name: &str,
        unit: (&str, &str),
    ) -> std::result::Result<(), DataReadingError> {
        let encoded = encode_array(values, self.compress)?;
        let encoded_len = encoded.len().to_string();
        self.start(
            BytesStart::new("binaryDataArray")
                .with_attributes([("encodedLength", encoded_len.as_str())]),
        )?;
        self.cv_param(cv::FLOAT_64, "64-bit float", "")?;
        if self.compress {
            self.cv_param(cv::ZLIB_COMPRESSION, "zlib compression", "")?;
        } else {
            self.cv_param(cv::NO_COMPRESSION, "no compression", "")?;
        }
        self.empty(BytesStart::new("cvParam").with_attributes([
            ("cvRef", "MS"),
            ("accession", accession),
            ("name", name),
            ("value", ""),
            ("unitCvRef", "MS"),
            ("unitAccession", unit.0),
            ("unitName", unit.1),
        ]))?;
        self.start(BytesStart::new("binary"))?;
        self.writer
            .write_event(Event::Text(BytesText::new(&encoded)))?;
        self.end("binary")?;
        self.end("binaryDataArray")
    }

    fn write_spectrum(&mut self, spectrum: &Spectrum) -> std::result::Result<(), DataReadingError> {
        let index = spectrum.index.to_string();
        let len = spectrum.len().to_string();
        self.start(BytesStart::new("spectrum").with_attributes([
            ("index", index.as_str()),
            ("id", spectrum.native_id.as_str()),
            ("defaultArrayLength", len.as_str()),
        ]))?;
        let level = spectrum.ms_level.to_string();
        self.cv_param(cv::MS_LEVEL, "ms level", &level)?;
        self.cv_param(cv::CENTROID_SPECTRUM, "centroid spectrum", "")?;

        if let Some(rt) = spectrum.retention_time_seconds {
            self.start(BytesStart::new("scanList").with_attributes([("count", "1")]))?;
            self.cv_param(cv::NO_COMBINATION, "no combination", "")?;
            self.start(BytesStart::new("scan"))?;
            let rt = rt.to_string();
            self.empty(BytesStart::new("cvParam").with_attributes([
                ("cvRef", "MS"),
                ("accession", cv::SCAN_START_TIME),
                ("name", "scan start time"),
                ("value", rt.as_str()),
                ("unitCvRef", "UO"),
                ("unitAccession", cv::UNIT_SECOND),
                ("unitName", "second"),
            ]))?;
            self.end("scan")?;
            self.end("scanList")?;
        }

        self.start(BytesStart::new("binaryDataArrayList").with_attributes([("count", "2")]))?;
        self.write_array(
            spectrum.mz(),
            cv::MZ_ARRAY,
            "m/z array",
            (cv::UNIT_MZ, "m/z"),
        )?;
        self.write_array(
            spectrum.intensity(),
            cv::INTENSITY_ARRAY,
            "intensity array",
            (cv::UNIT_COUNTS, "number of detector counts"),
        )?;
        self.end("binaryDataArrayList")?;
        self.end("spectrum")
    }
}

impl<W: Write + Send> SpectrumSink for MzMLWriter<W> {
    fn consume(&mut self, spectrum: Spectrum) -> Result<()> {
        self.write_spectrum(&spectrum)?;
        self.written += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        if self.written != self.expected {
            return Err(DataProcessingError::IncompleteOutput {
                delivered: self.written,
                expected: self.expected,
            }
            .into());
        }
        self.end("spectrumList")?;
        self.end("run")?;
        self.end("mzML")?;
        let mut inner = self.writer.into_inner();
        inner.write_all(b"\n")?;
        inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        MzMLSource,
        SpectrumSource,
    };

    #[test]
    fn test_written_file_reads_back() {
        let dir = std::env::temp_dir().join(format!("hitime_writer_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scores.mzML");

        let spectra = vec![
            Spectrum::try_new(0, vec![100.0, 106.0201], vec![0.0, 7.5])
                .unwrap()
                .with_native_id("scan=1".to_string())
                .with_retention_time(12.5),
            Spectrum::try_new(1, vec![], vec![]).unwrap(),
        ];
        let mut writer = MzMLWriter::create(&path, spectra.len(), true).unwrap();
        for s in spectra.iter().cloned() {
            writer.consume(s).unwrap();
        }
        writer.finish().unwrap();

        let mut source = MzMLSource::open(&path).unwrap();
        assert_eq!(source.len(), 2);
        let first = source.load(0).unwrap();
        assert_eq!(first.native_id, "scan=1");
        assert_eq!(first.mz(), spectra[0].mz());
        assert_eq!(first.intensity(), spectra[0].intensity());
        assert_eq!(first.retention_time_seconds, Some(12.5));
        assert!(source.load(1).unwrap().is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_finish_requires_every_spectrum() {
        let mut writer = MzMLWriter::new(Vec::new(), 2, false).unwrap();
        writer
            .consume(Spectrum::try_new(0, vec![1.0], vec![1.0]).unwrap())
            .unwrap();
        assert!(writer.finish().is_err());
    }
}
