//! Builds synthetic chunks for unit tests.

pub(crate) const CHUNK_MAGIC: [u8; 4] = [0x33, 0xEA, 0x00, 0x00];
pub(crate) const CHUNK_MAGIC_TAIL: [u8; 4] = [0x2D, 0x00, 0x02, 0x1C];

const SUBMESH_HEADER_LEN: usize = 0x10;
const VERTEX_INFO_LEN: usize = 0x34;

pub(crate) fn sample_position(i: usize) -> [f32; 3] {
    [i as f32, i as f32 + 0.5, -(i as f32)]
}

pub(crate) fn sample_uv(i: usize) -> [f32; 2] {
    [i as f32 / 10.0, 0.25 + i as f32 / 100.0]
}

/// One vertex record of `stride` bytes: big-endian position at 0 and each
/// `(offset_from_end, uv)` pair written at `stride - offset_from_end`.
pub(crate) fn vertex_record(
    stride: usize,
    position: [f32; 3],
    uvs: &[(usize, [f32; 2])],
) -> Vec<u8> {
    let mut record = vec![0u8; stride];
    for (i, c) in position.iter().enumerate() {
        record[i * 4..i * 4 + 4].copy_from_slice(&c.to_be_bytes());
    }
    for &(from_end, [u, v]) in uvs {
        let at = stride - from_end;
        record[at..at + 4].copy_from_slice(&u.to_be_bytes());
        record[at + 4..at + 8].copy_from_slice(&v.to_be_bytes());
    }
    record
}

#[derive(Debug, Clone)]
pub(crate) struct SubmeshSpec {
    pub stride: u32,
    pub vertex_bytes: Vec<u8>,
    pub vertex_total_size: Option<u32>,
    pub indices: Vec<u16>,
}

impl SubmeshSpec {
    /// `vertex_count` sample vertices with one UV channel in the last 8 bytes.
    pub fn triangle_list(stride: u32, vertex_count: usize, indices: &[u16]) -> Self {
        let vertex_bytes = (0..vertex_count)
            .flat_map(|i| vertex_record(stride as usize, sample_position(i), &[(8, sample_uv(i))]))
            .collect();
        Self {
            stride,
            vertex_bytes,
            vertex_total_size: None,
            indices: indices.to_vec(),
        }
    }

    pub fn total_size(mut self, total: u32) -> Self {
        self.vertex_total_size = Some(total);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ChunkBuilder {
    signature_word: u32,
    data_table_count: u32,
    submeshes: Vec<SubmeshSpec>,
}

#[derive(Debug, Clone)]
pub(crate) struct BuiltChunk {
    pub bytes: Vec<u8>,
    pub face_data_offset: u32,
}

fn put_be(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

impl ChunkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signature_word(mut self, word: u32) -> Self {
        self.signature_word = word;
        self
    }

    pub fn data_table_count(mut self, count: u32) -> Self {
        self.data_table_count = count;
        self
    }

    pub fn submesh(mut self, spec: SubmeshSpec) -> Self {
        self.submeshes.push(spec);
        self
    }

    /// Lay out signature, header, tables, per-submesh blocks, then the
    /// vertex and index payload. Offsets inside the chunk are relative to
    /// `mesh_chunk_start`, which sits 24 bytes after the signature.
    pub fn build(self) -> BuiltChunk {
        let n = self.submeshes.len();
        let submesh_table = 0x1C + 8 * self.data_table_count as usize;
        let headers = submesh_table + 0xC * n;
        let infos = headers + SUBMESH_HEADER_LEN * n;
        let face_data = infos + VERTEX_INFO_LEN * n;

        let mut payload = Vec::new();
        let mut starts = Vec::with_capacity(n);
        for spec in &self.submeshes {
            let vertex_start = payload.len() as u32;
            payload.extend_from_slice(&spec.vertex_bytes);
            let face_start = payload.len() as u32;
            for index in &spec.indices {
                payload.extend_from_slice(&index.to_be_bytes());
            }
            starts.push((vertex_start, face_start));
        }

        let mut body = vec![0u8; 0x14];
        put_be(&mut body, self.data_table_count);
        put_be(&mut body, n as u32);
        body.extend(std::iter::repeat_n(0xAB, 8 * self.data_table_count as usize));
        for i in 0..n {
            body.extend_from_slice(&[0xCD; 8]);
            put_be(&mut body, (headers + i * SUBMESH_HEADER_LEN) as u32);
        }
        for i in 0..n {
            body.extend_from_slice(&[0; 0xC]);
            put_be(&mut body, (infos + i * VERTEX_INFO_LEN) as u32);
        }
        for (spec, &(vertex_start, face_start)) in self.submeshes.iter().zip(&starts) {
            let vertex_count = if spec.stride == 0 {
                0
            } else {
                spec.vertex_bytes.len() as u32 / spec.stride
            };
            put_be(
                &mut body,
                spec.vertex_total_size.unwrap_or(vertex_count * spec.stride),
            );
            put_be(&mut body, spec.stride);
            body.extend_from_slice(&[0; 8]);
            put_be(&mut body, vertex_start);
            body.extend_from_slice(&[0; 0x14]);
            // the format stores twice the number of indices
            put_be(&mut body, spec.indices.len() as u32 * 2);
            body.extend_from_slice(&[0; 4]);
            put_be(&mut body, face_start);
        }
        assert_eq!(body.len(), face_data);
        body.extend_from_slice(&payload);

        let mut bytes = CHUNK_MAGIC.to_vec();
        put_be(&mut bytes, self.signature_word);
        bytes.extend_from_slice(&CHUNK_MAGIC_TAIL);
        bytes.extend_from_slice(&[0; 4]);
        bytes.extend_from_slice(&(face_data as u32).to_le_bytes());
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&body);

        BuiltChunk {
            bytes,
            face_data_offset: face_data as u32,
        }
    }
}
