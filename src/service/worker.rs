// src/service/worker.rs

//! Queue adapter between host scheduler tasks and the acquisition service.
//!
//! Producer tasks [`submit`](Worker::submit) requests; the single worker
//! task calls [`pump`](Worker::pump) from its loop body and producers
//! collect their answers via [`take_response`](Worker::take_response),
//! correlating by the caller-chosen request id. Task creation itself stays
//! with the host scheduler.

use core::fmt::Debug;

use heapless::Deque;

use crate::common::error::Aht21Error;
use crate::common::hal_traits::{AcquisitionLock, I2cBus, TaskYield, Timebase};

use super::{AcquisitionService, Measurement, ReadKind};

/// One queued acquisition request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Request {
    /// Caller-chosen correlation id, echoed back in the response.
    pub id: u32,
    pub wants_temperature: bool,
    pub wants_humidity: bool,
    /// Maximum acceptable age of the served reading.
    pub max_age_ticks: u32,
}

/// The answer to one [`Request`], correlated by id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response<E: Debug> {
    pub id: u32,
    pub result: Result<Measurement, Aht21Error<E>>,
}

/// Bounded FIFO front end for an [`AcquisitionService`].
///
/// `DEPTH` bounds both queues. Requests that race within one staleness
/// window share a single hardware transaction through the service cache.
#[derive(Debug)]
pub struct Worker<B, T, Y, L, const DEPTH: usize>
where
    B: I2cBus,
{
    service: AcquisitionService<B, T, Y, L>,
    requests: Deque<Request, DEPTH>,
    responses: Deque<Response<B::Error>, DEPTH>,
}

impl<B, T, Y, L, const DEPTH: usize> Worker<B, T, Y, L, DEPTH>
where
    B: I2cBus,
    T: Timebase,
    Y: TaskYield,
    L: AcquisitionLock,
{
    pub fn new(service: AcquisitionService<B, T, Y, L>) -> Self {
        Worker {
            service,
            requests: Deque::new(),
            responses: Deque::new(),
        }
    }

    /// Enqueues a request. A full queue hands the request back to the
    /// caller instead of blocking the producer task.
    pub fn submit(&mut self, request: Request) -> Result<(), Request> {
        self.requests.push_back(request)
    }

    /// Serves queued requests until the request queue is empty or the
    /// response queue is full. Returns the number of requests served. This
    /// is the worker task's loop body.
    pub fn pump(&mut self) -> usize {
        let mut served = 0;
        while !self.responses.is_full() {
            let Some(request) = self.requests.pop_front() else {
                break;
            };
            let response = Response {
                id: request.id,
                result: self.serve(&request),
            };
            // Capacity was checked above; the push cannot fail.
            let _ = self.responses.push_back(response);
            served += 1;
        }
        served
    }

    /// Oldest unanswered response, if any.
    pub fn take_response(&mut self) -> Option<Response<B::Error>> {
        self.responses.pop_front()
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Serves whatever is still queued, then stops the service.
    pub fn shutdown(&mut self) -> Result<(), Aht21Error<B::Error>> {
        self.pump();
        self.service.shutdown()
    }

    pub fn service(&self) -> &AcquisitionService<B, T, Y, L> {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut AcquisitionService<B, T, Y, L> {
        &mut self.service
    }

    fn serve(&mut self, request: &Request) -> Result<Measurement, Aht21Error<B::Error>> {
        let kind = ReadKind::from_flags(request.wants_temperature, request.wants_humidity)
            .ok_or(Aht21Error::InvalidRequest)?;
        self.service.request_reading(kind, request.max_age_ticks)
    }
}
