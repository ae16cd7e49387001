use log::trace;

use super::{CostFunction, Path, Request};
use crate::dsa::graph::HashMap;
use crate::network::{EdgeId, Network, Seconds};

// token bucket admission on priority queues.
// a queue accepts a request while the summed rates stay within its share of
// the link rate and the summed bursts fit in its buffer. the worst case delay
// of a queue is the time to drain its own buffer and every buffer served
// before it, plus the propagation delay of the link.

#[derive(Clone,Copy,Debug,Default,PartialEq)]
struct Reservation {
    rate:f64,
    burst:f64,
    requests:usize
}

#[derive(Clone,Debug,Default)]
pub struct TokenBucketAdmission {
    // keyed by queue edge
    reservations:HashMap<EdgeId,Reservation>
}

impl TokenBucketAdmission {
    pub fn new() -> Self {
        Self::default()
    }
    fn reservation(&self,edge:EdgeId) -> Reservation {
        self.reservations.get(&edge).copied().unwrap_or_default()
    }
    pub fn reserved_rate(&self,edge:EdgeId) -> f64 {
        self.reservation(edge).rate
    }
    pub fn reserved_burst(&self,edge:EdgeId) -> f64 {
        self.reservation(edge).burst
    }
    pub fn reserved_requests(&self,edge:EdgeId) -> usize {
        self.reservation(edge).requests
    }
}

impl CostFunction for TokenBucketAdmission {
    fn has_access(&self,network:&Network,edge:EdgeId,request:&Request) -> bool {
        let Some((link,queue)) = network.queue(edge) else {return false};
        let reserved = self.reservation(edge);
        reserved.rate + request.rate() <= link.rate()*queue.rate_share()
            && reserved.burst + request.burst() <= queue.buffer()
    }
    // hop count
    fn cost(&self,network:&Network,edge:EdgeId,_request:&Request) -> f64 {
        if network.queue(edge).is_some() {1.0} else {f64::INFINITY}
    }
    fn delay(&self,network:&Network,edge:EdgeId,_request:&Request) -> Seconds {
        let Some((link,queue)) = network.queue(edge) else {return f64::INFINITY};
        let backlog:f64 = link.queues().iter()
            .filter(|other| other.priority() <= queue.priority())
            .map(|other| other.buffer())
            .sum();
        backlog/link.rate() + link.propagation_delay()
    }
    fn register(&mut self,network:&Network,path:&Path,request:&Request) -> bool {
        if !path.edges().iter().all(|edge| self.has_access(network,*edge,request)) {
            return false;
        }
        for edge in path.edges() {
            let reservation = self.reservations.entry(*edge).or_default();
            reservation.rate += request.rate();
            reservation.burst += request.burst();
            reservation.requests += 1;
        }
        trace!("registered {:?} on {path:?}",request);
        true
    }
    fn deregister(&mut self,_network:&Network,path:&Path,request:&Request) -> bool {
        if !path.edges().iter().all(|edge| self.reservation(*edge).requests > 0) {
            return false;
        }
        for edge in path.edges() {
            let Some(reservation) = self.reservations.get_mut(edge) else {continue};
            reservation.requests -= 1;
            if reservation.requests == 0 {
                self.reservations.remove(edge);
                continue;
            }
            reservation.rate = (reservation.rate - request.rate()).max(0.0);
            reservation.burst = (reservation.burst - request.burst()).max(0.0);
        }
        trace!("released {:?} from {path:?}",request);
        true
    }
}
