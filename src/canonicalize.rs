//! Canonicalization utilities.
//!
//! Body canonicalization treats CRLF, bare CR, and bare LF alike as line
//! terminators: the body is read as if it had been converted to CRLF line
//! endings first.

use crate::signature::CanonicalizationAlgorithm;
use bstr::ByteSlice;

const SP: u8 = b' ';
const CR: u8 = b'\r';
const LF: u8 = b'\n';
const CRLF: [u8; 2] = [CR, LF];

fn is_body_wsp(b: u8) -> bool {
    // SP, HT, VT, FF
    matches!(b, b' ' | b'\t' | b'\x0b' | b'\x0c')
}

fn is_header_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0b' | '\x0c')
}

/// A streaming canonicalizer using the body canonicalization algorithm.
///
/// Chunk boundaries never influence the result: feeding a body in one piece
/// or byte by byte yields the same output.
pub struct BodyCanonicalizer {
    algorithm: CanonicalizationAlgorithm,
    line: Vec<u8>,  // current line, without terminator
    pending_wsp: bool,  // relaxed: whitespace seen but not yet written
    after_cr: bool,  // last byte was CR, an immediately following LF belongs to it
    empty_lines: usize,  // empty lines held back
    emitted: bool,  // whether any line was written
}

impl BodyCanonicalizer {
    pub fn new(algorithm: CanonicalizationAlgorithm) -> Self {
        Self {
            algorithm,
            line: vec![],
            pending_wsp: false,
            after_cr: false,
            empty_lines: 0,
            emitted: false,
        }
    }

    pub fn simple() -> Self {
        Self::new(CanonicalizationAlgorithm::Simple)
    }

    pub fn relaxed() -> Self {
        Self::new(CanonicalizationAlgorithm::Relaxed)
    }

    /// Canonicalizes a chunk of body content, returning the output that is
    /// final at this point.
    pub fn canonicalize_chunk(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut result = vec![];

        for &b in bytes {
            if self.after_cr {
                self.after_cr = false;
                if b == LF {
                    continue;
                }
            }

            match b {
                CR => {
                    self.end_line(&mut result);
                    self.after_cr = true;
                }
                LF => {
                    self.end_line(&mut result);
                }
                b => match self.algorithm {
                    CanonicalizationAlgorithm::Simple => {
                        self.line.push(b);
                    }
                    CanonicalizationAlgorithm::Relaxed => {
                        if is_body_wsp(b) {
                            self.pending_wsp = true;
                        } else {
                            if self.pending_wsp {
                                self.line.push(SP);
                                self.pending_wsp = false;
                            }
                            self.line.push(b);
                        }
                    }
                },
            }
        }

        result
    }

    /// Completes canonicalization, returning the remaining output.
    pub fn finish(mut self) -> Vec<u8> {
        let mut result = vec![];

        if !self.line.is_empty() {
            self.end_line(&mut result);
        }

        // an empty body canonicalizes to a single CRLF
        if !self.emitted {
            result.extend(CRLF);
        }

        result
    }

    // Empty lines are only written once a following non-empty line shows up;
    // trailing empty lines thus disappear.
    fn end_line(&mut self, result: &mut Vec<u8>) {
        self.pending_wsp = false;

        if self.line.is_empty() {
            self.empty_lines += 1;
            return;
        }

        for _ in 0..self.empty_lines {
            result.extend(CRLF);
        }
        self.empty_lines = 0;

        result.append(&mut self.line);
        result.extend(CRLF);

        self.emitted = true;
    }
}

/// Canonicalizes a complete body in one go.
pub fn canonicalize_body(algorithm: CanonicalizationAlgorithm, body: &[u8]) -> Vec<u8> {
    let mut canonicalizer = BodyCanonicalizer::new(algorithm);
    let mut result = canonicalizer.canonicalize_chunk(body);
    result.extend(canonicalizer.finish());
    result
}

/// Canonicalizes a header field into some result vector.
///
/// No line terminator is appended.
pub fn canonicalize_header(
    result: &mut Vec<u8>,
    algorithm: CanonicalizationAlgorithm,
    name: impl AsRef<str>,
    value: impl AsRef<[u8]>,
) {
    let name = name.as_ref();
    let value = value.as_ref();

    match algorithm {
        CanonicalizationAlgorithm::Simple => {
            result.extend(name.bytes());
            result.push(b':');
            result.extend(value);
        }
        CanonicalizationAlgorithm::Relaxed => {
            result.extend(name.trim().to_ascii_lowercase().bytes());
            result.push(b':');
            canonicalize_header_value_relaxed(result, value);
        }
    }
}

fn canonicalize_header_value_relaxed(result: &mut Vec<u8>, value: &[u8]) {
    let value = value.trim_with(is_header_space);

    let mut compressing = false;
    for &b in value {
        if is_header_space(b.into()) {
            if !compressing {
                result.push(SP);
                compressing = true;
            }
        } else {
            result.push(b);
            compressing = false;
        }
    }
}
