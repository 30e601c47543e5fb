// Copyright 2017 Parity Technologies (UK) Ltd.
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
// OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Length-prefixed framing plus the multistream sub-protocol negotiation dance, and the
//! dispatcher that routes a negotiated frame to a handler (spec §4.1-§4.3).

pub mod dispatch;
pub mod error;
pub mod frame;
pub mod negotiate;

pub use dispatch::{DispatchOutcome, Dispatcher, ProtocolHandler};
pub use error::MultistreamError;
pub use frame::{FrameConfig, FrameTransport, SetReadTimeout};
pub use negotiate::{negotiate_as_dialer, negotiate_as_listener, MULTISTREAM_PROTOCOL_ID};
