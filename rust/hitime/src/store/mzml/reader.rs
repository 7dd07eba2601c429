use super::binary::{
    decode_array,
    ArrayEncoding,
};
use super::cv;
use crate::errors::{
    DataReadingError,
    Result,
};
use crate::models::Spectrum;
use crate::store::SpectrumSource;
use quick_xml::events::{
    BytesStart,
    Event,
};
use quick_xml::Reader;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{
    Path,
    PathBuf,
};
use tracing::{
    debug,
    info,
};

/// mzML file exposed as random access spectra.
///
/// Opening the file runs a single pass that records the byte span of every
/// `<spectrum>` element and the contents of every referenceable parameter
/// group. Peaks are only decoded when a spectrum is loaded, so memory use is
/// the raw file plus whatever the cache keeps alive.
#[derive(Debug)]
pub struct MzMLSource {
    path: Option<PathBuf>,
    data: Vec<u8>,
    spans: Vec<Range<usize>>,
    param_groups: HashMap<String, Vec<CvParam>>,
}

impl MzMLSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| DataReadingError::Io {
            source,
            path: Some(path.to_path_buf()),
        })?;
        let mut out = Self::from_bytes(data)?;
        info!(
            "Indexed {} spectra in {}",
            out.spans.len(),
            path.display()
        );
        out.path = Some(path.to_path_buf());
        Ok(out)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let (spans, param_groups) = index_file(&data)?;
        Ok(Self {
            path: None,
            data,
            spans,
            param_groups,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SpectrumSource for MzMLSource {
    fn len(&self) -> usize {
        self.spans.len()
    }

    fn load(&mut self, index: usize) -> Result<Spectrum> {
        let span = self.spans.get(index).cloned().ok_or_else(|| {
            crate::errors::DataProcessingError::IndexOutOfBounds {
                index,
                len: self.spans.len(),
            }
        })?;
        debug!("Decoding spectrum {} from bytes {:?}", index, span);
        let parsed = parse_spectrum(&self.data[span], index, &self.param_groups)?;
        parsed.into_spectrum(index)
    }
}

/// One `<cvParam>`, either inline or from a referenceable parameter group.
#[derive(Debug, Clone, Default, PartialEq)]
struct CvParam {
    accession: String,
    value: Option<String>,
    unit_accession: Option<String>,
    unit_name: Option<String>,
}

impl CvParam {
    fn from_element(e: &BytesStart) -> std::result::Result<Self, DataReadingError> {
        Ok(Self {
            accession: attr(e, b"accession")?.unwrap_or_default(),
            value: attr(e, b"value")?,
            unit_accession: attr(e, b"unitAccession")?,
            unit_name: attr(e, b"unitName")?,
        })
    }

    fn parsed_value<T: std::str::FromStr>(&self) -> Option<T> {
        self.value.as_deref().and_then(|v| v.trim().parse().ok())
    }
}

type FileIndex = (Vec<Range<usize>>, HashMap<String, Vec<CvParam>>);

fn index_file(data: &[u8]) -> std::result::Result<FileIndex, DataReadingError> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut spans = Vec::new();
    let mut param_groups = HashMap::new();
    let mut open: Option<usize> = None;
    let mut group: Option<(String, Vec<CvParam>)> = None;
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"spectrum" => {
                open = Some(before);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"spectrum" => {
                spans.push(before..reader.buffer_position() as usize);
            }
            Event::End(e) if e.local_name().as_ref() == b"spectrum" => {
                let start = open.take().ok_or_else(|| DataReadingError::MalformedMzML {
                    msg: "closing </spectrum> without an opening tag".into(),
                })?;
                spans.push(start..reader.buffer_position() as usize);
            }
            Event::Start(e) if e.local_name().as_ref() == b"referenceableParamGroup" => {
                group = Some((attr(&e, b"id")?.unwrap_or_default(), Vec::new()));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"referenceableParamGroup" => {
                param_groups.insert(attr(&e, b"id")?.unwrap_or_default(), Vec::new());
            }
            Event::Empty(e) if e.local_name().as_ref() == b"cvParam" => {
                if let Some((_, params)) = group.as_mut() {
                    params.push(CvParam::from_element(&e)?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"referenceableParamGroup" => {
                if let Some((id, params)) = group.take() {
                    param_groups.insert(id, params);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if open.is_some() {
        return Err(DataReadingError::MalformedMzML {
            msg: "file ends inside a <spectrum> element".into(),
        });
    }
    Ok((spans, param_groups))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayKind {
    Mz,
    Intensity,
    Other,
}

#[derive(Debug)]
struct PendingArray {
    kind: ArrayKind,
    encoding: ArrayEncoding,
    payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct ParsedSpectrum {
    id: Option<String>,
    ms_level: Option<u8>,
    retention_time_seconds: Option<f64>,
    mz: Option<Vec<f64>>,
    intensity: Option<Vec<f64>>,
}

impl ParsedSpectrum {
    fn into_spectrum(self, index: usize) -> Result<Spectrum> {
        let mz = self.mz.ok_or_else(|| missing_array(index, "m/z"))?;
        let intensity = self
            .intensity
            .ok_or_else(|| missing_array(index, "intensity"))?;
        let mut spectrum = Spectrum::try_new(index, mz, intensity)?;
        if let Some(id) = self.id {
            spectrum = spectrum.with_native_id(id);
        }
        if let Some(level) = self.ms_level {
            spectrum = spectrum.with_ms_level(level);
        }
        if let Some(rt) = self.retention_time_seconds {
            spectrum = spectrum.with_retention_time(rt);
        }
        Ok(spectrum)
    }
}

fn missing_array(index: usize, what: &str) -> DataReadingError {
    DataReadingError::MalformedMzML {
        msg: format!("spectrum {} has no {} array", index, what),
    }
}

fn attr(e: &BytesStart, name: &[u8]) -> std::result::Result<Option<String>, DataReadingError> {
    for a in e.attributes() {
        let a = a?;
        if a.key.as_ref() == name {
            return Ok(Some(String::from_utf8_lossy(&a.value).into_owned()));
        }
    }
    Ok(None)
}

#[derive(Debug, Default)]
struct SpectrumParser {
    out: ParsedSpectrum,
    pending: Option<PendingArray>,
    in_binary: bool,
    in_scan: bool,
}

impl SpectrumParser {
    fn apply(&mut self, param: &CvParam) {
        if let Some(array) = self.pending.as_mut() {
            match param.accession.as_str() {
                cv::MZ_ARRAY => array.kind = ArrayKind::Mz,
                cv::INTENSITY_ARRAY => array.kind = ArrayKind::Intensity,
                other => {
                    array.encoding.apply_accession(other);
                }
            }
            return;
        }
        match param.accession.as_str() {
            cv::MS_LEVEL => self.out.ms_level = param.parsed_value(),
            cv::SCAN_START_TIME if self.in_scan => {
                let in_minutes = param.unit_accession.as_deref() == Some(cv::UNIT_MINUTE)
                    || param.unit_name.as_deref() == Some("minute");
                self.out.retention_time_seconds = param
                    .parsed_value::<f64>()
                    .map(|v| if in_minutes { v * 60.0 } else { v });
            }
            _ => {}
        }
    }
}

fn parse_spectrum(
    bytes: &[u8],
    index: usize,
    param_groups: &HashMap<String, Vec<CvParam>>,
) -> std::result::Result<ParsedSpectrum, DataReadingError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut state = SpectrumParser::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"spectrum" => {
                state.out.id = attr(&e, b"id")?;
                // An empty spectrum element still needs (empty) arrays.
                if attr(&e, b"defaultArrayLength")?.as_deref() == Some("0") {
                    state.out.mz = Some(Vec::new());
                    state.out.intensity = Some(Vec::new());
                }
            }
            Event::Start(e) => match e.local_name().as_ref() {
                b"scan" => state.in_scan = true,
                b"binaryDataArray" => {
                    state.pending = Some(PendingArray {
                        kind: ArrayKind::Other,
                        encoding: ArrayEncoding::default(),
                        payload: Vec::new(),
                    })
                }
                b"binary" => state.in_binary = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"cvParam" => {
                state.apply(&CvParam::from_element(&e)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"referenceableParamGroupRef" => {
                let id = attr(&e, b"ref")?.unwrap_or_default();
                let params = param_groups
                    .get(&id)
                    .ok_or_else(|| DataReadingError::MalformedMzML {
                        msg: format!(
                            "spectrum {} references unknown parameter group '{}'",
                            index, id
                        ),
                    })?;
                for param in params {
                    state.apply(param);
                }
            }
            Event::Text(t) if state.in_binary => {
                if let Some(array) = state.pending.as_mut() {
                    array.payload.extend_from_slice(&t.into_inner());
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"scan" => state.in_scan = false,
                b"binary" => state.in_binary = false,
                b"binaryDataArray" => {
                    if let Some(array) = state.pending.take() {
                        if array.kind == ArrayKind::Other {
                            continue;
                        }
                        let values = decode_array(&array.payload, &array.encoding, index)?;
                        match array.kind {
                            ArrayKind::Mz => state.out.mz = Some(values),
                            ArrayKind::Intensity => state.out.intensity = Some(values),
                            ArrayKind::Other => {}
                        }
                    }
                }
                b"spectrum" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(state.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mzml::binary::encode_array;

    fn spectrum_xml(index: usize, mz: &[f64], intensity: &[f64], minutes: f64) -> String {
        format!(
            r#"<spectrum index="{index}" id="scan={scan}" defaultArrayLength="{len}">
  <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
  <scanList count="1">
    <scan>
      <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="{minutes}" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/>
    </scan>
  </scanList>
  <binaryDataArrayList count="2">
    <binaryDataArray encodedLength="0">
      <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float" value=""/>
      <cvParam cvRef="MS" accession="MS:1000574" name="zlib compression" value=""/>
      <cvParam cvRef="MS" accession="MS:1000514" name="m/z array" value=""/>
      <binary>{mz}</binary>
    </binaryDataArray>
    <binaryDataArray encodedLength="0">
      <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float" value=""/>
      <cvParam cvRef="MS" accession="MS:1000576" name="no compression" value=""/>
      <cvParam cvRef="MS" accession="MS:1000515" name="intensity array" value=""/>
      <binary>{intensity}</binary>
    </binaryDataArray>
  </binaryDataArrayList>
</spectrum>"#,
            index = index,
            scan = index + 1,
            len = mz.len(),
            minutes = minutes,
            mz = encode_array(mz, true).unwrap(),
            intensity = encode_array(intensity, false).unwrap(),
        )
    }

    fn document(spectra: &[String]) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <run id="test">
    <spectrumList count="{}">
{}
    </spectrumList>
  </run>
</mzML>"#,
            spectra.len(),
            spectra.join("\n")
        )
        .into_bytes()
    }

    #[test]
    fn test_index_and_load() {
        let doc = document(&[
            spectrum_xml(0, &[100.0, 200.0], &[1.0, 2.0], 0.5),
            spectrum_xml(1, &[150.0], &[3.0], 1.0),
        ]);
        let mut source = MzMLSource::from_bytes(doc).unwrap();
        assert_eq!(source.len(), 2);

        let second = source.load(1).unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.native_id, "scan=2");
        assert_eq!(second.mz(), &[150.0]);
        assert_eq!(second.intensity(), &[3.0]);
        assert_eq!(second.retention_time_seconds, Some(60.0));

        let first = source.load(0).unwrap();
        assert_eq!(first.mz(), &[100.0, 200.0]);
        assert_eq!(first.ms_level, 1);
        assert!(source.load(2).is_err());
    }

    #[test]
    fn test_missing_intensity_array_is_an_error() {
        let doc = br#"<mzML><run><spectrumList count="1">
<spectrum index="0" id="a" defaultArrayLength="1">
  <binaryDataArrayList count="1">
    <binaryDataArray>
      <cvParam accession="MS:1000514"/>
      <binary>AAAAAAAAWUA=</binary>
    </binaryDataArray>
  </binaryDataArrayList>
</spectrum>
</spectrumList></run></mzML>"#;
        let mut source = MzMLSource::from_bytes(doc.to_vec()).unwrap();
        assert!(source.load(0).is_err());
    }

    fn grouped_document(mz: &[f64], intensity: &[f64], group_ref: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <referenceableParamGroupList count="2">
    <referenceableParamGroup id="mz_params">
      <cvParam cvRef="MS" accession="MS:1000514" name="m/z array" value=""/>
      <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float" value=""/>
      <cvParam cvRef="MS" accession="MS:1000574" name="zlib compression" value=""/>
    </referenceableParamGroup>
    <referenceableParamGroup id="intensity_params">
      <cvParam cvRef="MS" accession="MS:1000515" name="intensity array" value=""/>
      <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float" value=""/>
      <cvParam cvRef="MS" accession="MS:1000576" name="no compression" value=""/>
    </referenceableParamGroup>
  </referenceableParamGroupList>
  <run id="test">
    <spectrumList count="1">
      <spectrum index="0" id="scan=1" defaultArrayLength="{len}">
        <binaryDataArrayList count="2">
          <binaryDataArray encodedLength="0">
            <referenceableParamGroupRef ref="mz_params"/>
            <binary>{mz}</binary>
          </binaryDataArray>
          <binaryDataArray encodedLength="0">
            <referenceableParamGroupRef ref="{group_ref}"/>
            <binary>{intensity}</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>
    </spectrumList>
  </run>
</mzML>"#,
            len = mz.len(),
            mz = encode_array(mz, true).unwrap(),
            intensity = encode_array(intensity, false).unwrap(),
            group_ref = group_ref,
        )
        .into_bytes()
    }

    #[test]
    fn test_array_params_from_referenceable_groups() {
        let doc = grouped_document(&[100.0, 200.0, 300.0], &[4.0, 5.0, 6.0], "intensity_params");
        let mut source = MzMLSource::from_bytes(doc).unwrap();
        assert_eq!(source.len(), 1);
        let spectrum = source.load(0).unwrap();
        assert_eq!(spectrum.mz(), &[100.0, 200.0, 300.0]);
        assert_eq!(spectrum.intensity(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_unknown_param_group_is_an_error() {
        let doc = grouped_document(&[100.0], &[1.0], "no_such_group");
        let mut source = MzMLSource::from_bytes(doc).unwrap();
        assert!(matches!(
            source.load(0),
            Err(crate::errors::HitimeError::DataReading(
                DataReadingError::MalformedMzML { .. }
            ))
        ));
    }

    #[test]
    fn test_truncated_file_fails_to_index() {
        let doc = br#"<mzML><run><spectrumList count="1"><spectrum index="0" id="a">"#;
        assert!(MzMLSource::from_bytes(doc.to_vec()).is_err());
    }
}
